use std::collections::BTreeMap;

/// One of the four HIPPO vacuum gauges, numbered 1 to 4
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gauge(u8);

impl Gauge {
    pub const ALL: [Gauge; 4] = [Gauge(1), Gauge(2), Gauge(3), Gauge(4)];

    pub fn new(number: u8) -> Option<Gauge> {
        match number {
            1..=4 => Some(Gauge(number)),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

/// The three readings reported by each HIPPO gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Reading {
    Ionization,
    Convection1,
    Convection2,
}

impl Reading {
    pub const ALL: [Reading; 3] = [Reading::Ionization, Reading::Convection1, Reading::Convection2];

    /// column of the reading in the recorded grid
    pub fn index(self) -> usize {
        match self {
            Reading::Ionization => 0,
            Reading::Convection1 => 1,
            Reading::Convection2 => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Reading> {
        Reading::ALL.get(index).copied()
    }
}

/// The HIPPO pressures of one record, as laid out by the recorder:
/// 5 rows by 3 readings, where row `g` holds gauge `g`.
/// Row 0 is reserved by that layout and never holds a gauge,
/// it is kept only so that rows and gauge numbers coincide.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HippoGrid([[f64; 3]; 5]);

impl HippoGrid {
    pub const ROWS: usize = 5;

    pub fn get(&self, gauge: Gauge, reading: Reading) -> f64 {
        self.0[gauge.number() as usize][reading.index()]
    }

    pub fn set(&mut self, gauge: Gauge, reading: Reading, value: f64) {
        self.0[gauge.number() as usize][reading.index()] = value;
    }

    /// writes the reserved row 0, which the recorder may fill
    pub(crate) fn set_unused(&mut self, reading: Reading, value: f64) {
        self.0[0][reading.index()] = value;
    }

    pub fn row(&self, gauge: Gauge) -> [f64; 3] {
        self.0[gauge.number() as usize]
    }
}

/// One row of the data file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureRecord {
    /// seconds since the unix epoch, UTC
    pub time: f64,
    /// mbar
    pub baratron: f64,
    pub hippo: HippoGrid,
}

/// The columnar pressure time series.
/// Built only by appending whole records, so every column keeps the same length
/// and index `i` always refers to the `i`-th record.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureSeries {
    time: Vec<f64>,
    baratron: Vec<f64>,
    hippo: BTreeMap<(Gauge, Reading), Vec<f64>>,
}

impl PressureSeries {
    pub fn new(capacity: usize) -> PressureSeries {
        let mut hippo = BTreeMap::new();
        for &gauge in Gauge::ALL.iter() {
            for &reading in Reading::ALL.iter() {
                hippo.insert((gauge, reading), Vec::with_capacity(capacity));
            }
        }
        PressureSeries {
            time: Vec::with_capacity(capacity),
            baratron: Vec::with_capacity(capacity),
            hippo,
        }
    }

    pub fn push(&mut self, record: &PressureRecord) {
        self.time.push(record.time);
        self.baratron.push(record.baratron);
        for (&(gauge, reading), column) in self.hippo.iter_mut() {
            column.push(record.hippo.get(gauge, reading));
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn baratron(&self) -> &[f64] {
        &self.baratron
    }

    pub fn hippo(&self, gauge: Gauge, reading: Reading) -> &[f64] {
        // every key is inserted by new()
        &self.hippo[&(gauge, reading)]
    }

    pub fn baratron_points(&self) -> Vec<(f64, f64)> {
        zip_points(&self.time, &self.baratron)
    }

    pub fn hippo_points(&self, gauge: Gauge, reading: Reading) -> Vec<(f64, f64)> {
        zip_points(&self.time, self.hippo(gauge, reading))
    }
}

fn zip_points(time: &[f64], values: &[f64]) -> Vec<(f64, f64)> {
    time.iter().copied().zip(values.iter().copied()).collect()
}

impl std::fmt::Display for PressureSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "time [s], baratron [mbar]")?;
        for (t, p) in self.time.iter().zip(self.baratron.iter()) {
            writeln!(f, "{},{}", t, p)?;
        }
        Ok(())
    }
}
