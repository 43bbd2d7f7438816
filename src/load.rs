use crate::error::PressureError;
use crate::series::{Gauge, HippoGrid, PressureRecord, PressureSeries, Reading};
use crate::DT_FORMAT;
use chrono::prelude::*;
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub const COL_DATETIME: &str = "date_time";
pub const COL_BARATRON: &str = "baratron_pressure";

/// header name of one cell of the HIPPO grid
pub fn hippo_column(row: usize, reading: Reading) -> String {
    format!("hippo_pressures[{}][{}]", row, reading.index())
}

/// Column positions of the fields, resolved once from the header
struct Columns {
    datetime: usize,
    baratron: usize,
    hippo: Vec<(Gauge, Reading, usize)>,
    unused_row: Vec<(Reading, usize)>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Columns, PressureError> {
        let names: Vec<&str> = headers.iter().map(|h| h.trim()).collect();
        let find = |name: &str| names.iter().position(|h| *h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| PressureError::MalformedRecord {
                line: 1,
                field: name.to_string(),
                reason: "column missing from header".to_string(),
            })
        };
        let datetime = require(COL_DATETIME)?;
        let baratron = require(COL_BARATRON)?;
        let mut hippo = Vec::with_capacity(Gauge::ALL.len() * Reading::ALL.len());
        for &gauge in Gauge::ALL.iter() {
            for &reading in Reading::ALL.iter() {
                let idx = require(hippo_column(gauge.number() as usize, reading).as_str())?;
                hippo.push((gauge, reading, idx));
            }
        }
        let unused_row = Reading::ALL
            .iter()
            .filter_map(|&reading| find(hippo_column(0, reading).as_str()).map(|idx| (reading, idx)))
            .collect();
        Ok(Columns {
            datetime,
            baratron,
            hippo,
            unused_row,
        })
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str, line: u64) -> Result<&'r str, PressureError> {
    match record.get(idx).map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PressureError::MalformedRecord {
            line,
            field: name.to_string(),
            reason: "missing value".to_string(),
        }),
    }
}

fn float_field(record: &csv::StringRecord, idx: usize, name: &str, line: u64) -> Result<f64, PressureError> {
    let raw = field(record, idx, name, line)?;
    raw.parse::<f64>().map_err(|e| PressureError::MalformedRecord {
        line,
        field: name.to_string(),
        reason: format!("invalid number `{}`, {}", raw, e),
    })
}

/// seconds since the unix epoch of a `DT_FORMAT` datetime, taken as UTC
pub fn parse_epoch(raw: &str) -> Result<f64, chrono::ParseError> {
    let dt = NaiveDateTime::parse_from_str(raw, DT_FORMAT)?;
    Ok(TimeZone::from_utc_datetime(&Utc, &dt).timestamp() as f64)
}

fn parse_record(
    record: &csv::StringRecord,
    columns: &Columns,
    line: u64,
) -> Result<PressureRecord, PressureError> {
    let raw_datetime = field(record, columns.datetime, COL_DATETIME, line)?;
    let time = parse_epoch(raw_datetime).map_err(|e| PressureError::MalformedRecord {
        line,
        field: COL_DATETIME.to_string(),
        reason: format!("invalid datetime `{}`, {}", raw_datetime, e),
    })?;
    let baratron = float_field(record, columns.baratron, COL_BARATRON, line)?;
    let mut hippo = HippoGrid::default();
    for &(gauge, reading, idx) in columns.hippo.iter() {
        let name = hippo_column(gauge.number() as usize, reading);
        hippo.set(gauge, reading, float_field(record, idx, &name, line)?);
    }
    for &(reading, idx) in columns.unused_row.iter() {
        let name = hippo_column(0, reading);
        hippo.set_unused(reading, float_field(record, idx, &name, line)?);
    }
    Ok(PressureRecord {
        time,
        baratron,
        hippo,
    })
}

fn echo_record(record: &PressureRecord, raw_datetime: &str) {
    debug!("{} baratron {}", raw_datetime, record.baratron);
    for &gauge in Gauge::ALL.iter() {
        let row = record.hippo.row(gauge);
        debug!("  gauge {}: {}\t{}\t{}", gauge.number(), row[0], row[1], row[2]);
    }
}

fn read_error(origin: &str, e: csv::Error) -> PressureError {
    let line = e.position().map_or(0, |p| p.line());
    match e.kind() {
        csv::ErrorKind::Io(_) => PressureError::SourceUnavailable {
            origin: origin.to_string(),
            reason: e.to_string(),
        },
        _ => PressureError::MalformedRecord {
            line,
            field: "<row>".to_string(),
            reason: e.to_string(),
        },
    }
}

impl PressureSeries {
    /// Loads the whole pressure time series from a csv data file.
    /// Fails on the first unusable record, no value is ever skipped or replaced.
    pub fn from_csv<P: AsRef<Path>>(fin: P) -> Result<PressureSeries, PressureError> {
        let fin = fin.as_ref();
        let origin = fin.display().to_string();
        let file = File::open(fin).map_err(|e| PressureError::SourceUnavailable {
            origin: origin.clone(),
            reason: e.to_string(),
        })?;
        PressureSeries::from_reader(BufReader::new(file), &origin)
    }

    /// Same as `from_csv`, from any reader; `origin` names the source in errors.
    pub fn from_reader<R: Read>(rdr: R, origin: &str) -> Result<PressureSeries, PressureError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);

        let headers = csv_reader.headers().map_err(|e| read_error(origin, e))?.clone();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(PressureError::SourceUnavailable {
                origin: origin.to_string(),
                reason: "no record table (missing header row)".to_string(),
            });
        }
        let columns = Columns::from_headers(&headers)?;

        let mut series = PressureSeries::new(0);
        for result in csv_reader.records() {
            let record = result.map_err(|e| read_error(origin, e))?;
            let line = record.position().map_or(0, |p| p.line());
            let parsed = parse_record(&record, &columns, line)?;
            if log::log_enabled!(log::Level::Debug) {
                echo_record(&parsed, record.get(columns.datetime).unwrap_or_default());
            }
            series.push(&parsed);
        }
        info!("loaded {} records from {}", series.len(), origin);
        Ok(series)
    }
}
