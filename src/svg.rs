use crate::chart::{Chart, ChartRenderer, MarkerColor, MarkerShape, SeriesStyle};
use crate::error::PressureError;
use chrono::prelude::*;
use log::info;
use plotters::coord::Shift;
use plotters::element::{EmptyElement, Polygon, TriangleMarker};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const MARKER_SIZE: i32 = 4;
const FALLBACK_X_SPAN: f64 = 3600.;

/// Writes each chart as an svg file in one output directory.
/// `init` prepares the output once for the whole run, `finish` closes it.
pub struct SvgRenderer {
    out_dir: PathBuf,
    prefix: String,
    current: Option<Chart>,
    written: Vec<PathBuf>,
}

impl SvgRenderer {
    pub fn init<P: AsRef<Path>>(out_dir: P, prefix: &str) -> Result<SvgRenderer, PressureError> {
        let out_dir = out_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&out_dir).map_err(|e| {
            PressureError::render("<all>", format!("cannot prepare {}, {}", out_dir.display(), e))
        })?;
        if !out_dir.is_dir() {
            return Err(PressureError::render(
                "<all>",
                format!("{} is not a directory", out_dir.display()),
            ));
        }
        Ok(SvgRenderer {
            out_dir,
            prefix: prefix.to_string(),
            current: None,
            written: Vec::new(),
        })
    }

    pub fn path_for(&self, title: &str) -> PathBuf {
        let name = if self.prefix.is_empty() {
            format!("{}.svg", slug(title))
        } else {
            format!("{}_{}.svg", self.prefix, slug(title))
        };
        self.out_dir.join(name)
    }

    /// the written files, in rendering order
    pub fn finish(self) -> Result<Vec<PathBuf>, PressureError> {
        match self.current {
            Some(chart) => Err(PressureError::render(chart.title, "chart started but never rendered")),
            None => Ok(self.written),
        }
    }
}

impl ChartRenderer for SvgRenderer {
    fn current(&mut self) -> Option<&mut Chart> {
        self.current.as_mut()
    }

    fn new_chart(&mut self, title: &str) -> Result<(), PressureError> {
        if let Some(open) = &self.current {
            return Err(PressureError::render(open.title.clone(), "chart started but never rendered"));
        }
        self.current = Some(Chart::new(title));
        Ok(())
    }

    fn render(&mut self) -> Result<(), PressureError> {
        let chart = self
            .current
            .take()
            .ok_or_else(|| PressureError::render("<none>", "no chart started"))?;
        let fout = self.path_for(&chart.title);
        draw_chart(&chart, &fout).map_err(|e| PressureError::render(chart.title.as_str(), e))?;
        info!("plotted {} to {}", chart.title, fout.display());
        self.written.push(fout);
        Ok(())
    }
}

/// lowercase words joined by underscores
pub fn slug(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<String>>()
        .join("_")
}

pub fn epoch_to_datetime(x: f64) -> Option<DateTime<Utc>> {
    if !x.is_finite() {
        return None;
    }
    let secs = x.floor();
    let nanos = (((x - secs) * 1e9).round() as u32).min(999_999_999);
    Utc.timestamp_opt(secs as i64, nanos).single()
}

fn rgb(color: MarkerColor) -> RGBColor {
    match color {
        MarkerColor::Black => BLACK,
        MarkerColor::Red => RED,
        MarkerColor::Green => RGBColor(0, 160, 0),
        MarkerColor::Blue => BLUE,
    }
}

/// corners of the downward triangle marker, relative to its center
fn triangle_down() -> Vec<(i32, i32)> {
    let s = MARKER_SIZE;
    vec![(-s - 1, -s + 1), (s + 1, -s + 1), (0, s + 1)]
}

/// range of the data with a relative margin on each side,
/// or a fixed window around the data when the span is zero;
/// the bounds stay finite even for data close to the f64 limits
fn padded(min: f64, max: f64, pct: f64, fallback: f64) -> (f64, f64) {
    let half_span = max / 2. - min / 2.;
    let (lo, hi) = if half_span > 0. {
        let margin = half_span * 2. * pct;
        (min - margin, max + margin)
    } else {
        (min - fallback / 2., max + fallback / 2.)
    };
    (lo.max(f64::MIN), hi.min(f64::MAX))
}

fn data_ranges(chart: &Chart) -> Option<((f64, f64), (f64, f64))> {
    let mut points = chart.finite_points();
    let (x0, y0) = points.next()?;
    let (mut xmin, mut xmax, mut ymin, mut ymax) = (x0, x0, y0, y0);
    for (x, y) in points {
        xmin = xmin.min(x);
        xmax = xmax.max(x);
        ymin = ymin.min(y);
        ymax = ymax.max(y);
    }
    let yfallback = if y0.abs() > 0. { y0.abs() } else { 1. };
    Some((
        padded(xmin, xmax, 0.05, FALLBACK_X_SPAN),
        padded(ymin, ymax, 0.1, yfallback),
    ))
}

fn draw_legend<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, chart: &Chart) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let entries = chart.legend_entries();
    if entries.is_empty() {
        return Ok(());
    }
    let (width, height) = area.dim_in_pixel();
    let row_height = 30;
    let x0 = 10;
    let x1 = width as i32 - 10;
    let y0 = height as i32 / 10;
    let y1 = y0 + row_height * entries.len() as i32 + 10;
    area.draw(&Rectangle::new([(x0, y0), (x1, y1)], WHITE.filled()))?;
    area.draw(&Rectangle::new([(x0, y0), (x1, y1)], BLACK.stroke_width(1)))?;
    for (i, (label, style)) in entries.into_iter().enumerate() {
        let y = y0 + 5 + row_height * i as i32 + row_height / 2;
        area.draw(&PathElement::new(vec![(x0 + 10, y), (x0 + 40, y)], rgb(style.color).stroke_width(1)))?;
        let at = (x0 + 25, y);
        let fill = rgb(style.color).filled();
        let s = MARKER_SIZE;
        match style.shape {
            MarkerShape::Circle => area.draw(&Circle::new(at, s, fill))?,
            MarkerShape::Square => area.draw(&(EmptyElement::at(at) + Rectangle::new([(-s, -s), (s, s)], fill)))?,
            MarkerShape::TriangleUp => area.draw(&TriangleMarker::new(at, s + 1, fill))?,
            MarkerShape::TriangleDown => area.draw(&(EmptyElement::at(at) + Polygon::new(triangle_down(), fill)))?,
        }
        area.draw(&Text::new(label, (x0 + 50, y - 8), ("sans-serif", 16)))?;
    }
    Ok(())
}

/// plots the chart to svg
fn draw_chart(chart: &Chart, fout: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let layout = chart.layout;
    let ((xmin, xmax), (ymin, ymax)) = data_ranges(chart).unwrap_or(((0., FALLBACK_X_SPAN), (0., 1.)));
    if !(ymax - ymin).is_finite() {
        return Err("pressure range too wide to plot".into());
    }
    let xmindt = epoch_to_datetime(xmin).ok_or("time axis start out of range")?;
    let xmaxdt = epoch_to_datetime(xmax).ok_or("time axis end out of range")?;

    let root = SVGBackend::new(fout, layout.size).into_drawing_area();
    root.fill(&WHITE)?;
    let plot_width = (layout.size.0 as f64 * (1. - layout.legend_margin)).round() as i32;
    let (plot_area, legend_area) = root.split_horizontally(plot_width);

    let mut cc = ChartBuilder::on(&plot_area)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(xmindt..xmaxdt, ymin..ymax)?;
    let xfmt = chart.time_format.as_str();
    cc.configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
        .set_all_tick_mark_size(2)
        .label_style(("sans-serif", 14))
        .x_labels(layout.x_divisions)
        .x_label_formatter(&|x: &DateTime<Utc>| x.format(xfmt).to_string())
        .y_label_formatter(&|y: &f64| format!("{:.3e}", y))
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()?;

    for series in chart.series.iter() {
        let coords: Vec<(DateTime<Utc>, f64)> = series
            .points
            .iter()
            .filter_map(|&(x, y)| epoch_to_datetime(x).map(|t| (t, y)))
            .filter(|(_, y)| y.is_finite())
            .collect();
        if coords.is_empty() {
            continue;
        }
        let style = series.style;
        cc.draw_series(LineSeries::new(coords.iter().cloned(), rgb(style.color).stroke_width(1)))?;
        let fill = rgb(style.color).filled();
        let s = MARKER_SIZE;
        match style.shape {
            MarkerShape::Circle => cc.draw_series(coords.iter().map(|c| Circle::new(c.clone(), s, fill)))?,
            MarkerShape::Square => cc.draw_series(
                coords
                    .iter()
                    .map(|c| EmptyElement::at(c.clone()) + Rectangle::new([(-s, -s), (s, s)], fill)),
            )?,
            MarkerShape::TriangleUp => {
                cc.draw_series(coords.iter().map(|c| TriangleMarker::new(c.clone(), s + 1, fill)))?
            }
            MarkerShape::TriangleDown => cc.draw_series(
                coords
                    .iter()
                    .map(|c| EmptyElement::at(c.clone()) + Polygon::new(triangle_down(), fill)),
            )?,
        };
    }

    draw_legend(&legend_area, chart)?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartLayout, MarkerColor, SeriesStyle, BARATRON_STYLE};

    #[test]
    fn slugs() {
        assert_eq!(slug("Baratron Pressure"), "baratron_pressure");
        assert_eq!(slug("HIPPO Convection Gauge 1 Pressure"), "hippo_convection_gauge_1_pressure");
    }

    #[test]
    fn epoch_round_trip() {
        let dt = epoch_to_datetime(1609459200.).unwrap();
        assert_eq!(dt.format(crate::DT_FORMAT).to_string(), "2021-01-01 00:00:00");
        assert!(epoch_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn ranges_cover_the_data() {
        let mut chart = Chart::new("t");
        assert!(data_ranges(&chart).is_none());
        chart.series.push(crate::chart::Series {
            points: vec![(100., 2.), (200., 4.), (f64::NAN, 9.)],
            style: BARATRON_STYLE,
            legend: None,
        });
        let ((xmin, xmax), (ymin, ymax)) = data_ranges(&chart).unwrap();
        assert!(xmin < 100. && xmax > 200.);
        assert!(ymin < 2. && ymax > 4. && ymax < 9.);
    }

    #[test]
    fn extreme_values_keep_finite_ranges() {
        let mut chart = Chart::new("t");
        chart.series.push(crate::chart::Series {
            points: vec![(100., 1e308), (101., -1e308)],
            style: BARATRON_STYLE,
            legend: None,
        });
        let ((xmin, xmax), (ymin, ymax)) = data_ranges(&chart).unwrap();
        assert!(xmin.is_finite() && xmax.is_finite());
        assert!(ymin.is_finite() && ymax.is_finite());
        assert!(ymin <= -1e308 && ymax >= 1e308);
    }

    #[test]
    fn too_wide_range_is_a_render_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = SvgRenderer::init(dir.path(), "run").unwrap();
        renderer.new_chart("Baratron Pressure").unwrap();
        renderer
            .add_series(vec![(100., 1e308), (101., -1e308), (102., 1e308)], BARATRON_STYLE)
            .unwrap();
        match renderer.render() {
            Err(PressureError::RenderFailure { chart, .. }) => assert_eq!(chart, "Baratron Pressure"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(renderer.finish().unwrap().is_empty());
    }

    #[test]
    fn every_marker_shape_renders() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = SvgRenderer::init(dir.path(), "shapes").unwrap();
        let shapes = [
            MarkerShape::Circle,
            MarkerShape::Square,
            MarkerShape::TriangleUp,
            MarkerShape::TriangleDown,
        ];
        for (i, &shape) in shapes.iter().enumerate() {
            renderer.new_chart(&format!("Shape {}", i)).unwrap();
            renderer
                .set_layout(ChartLayout {
                    size: crate::HIPPO_CANVAS,
                    legend_margin: crate::LEGEND_MARGIN,
                    x_divisions: crate::X_DIVISIONS,
                })
                .unwrap();
            let style = SeriesStyle {
                shape,
                color: MarkerColor::Blue,
            };
            renderer
                .add_series(vec![(1609459200., 1.5), (1609459260., 2.5)], style)
                .unwrap();
            renderer.add_legend_entry("Gauge Number 1").unwrap();
            renderer.render().unwrap();
        }
        let written = renderer.finish().unwrap();
        assert_eq!(written.len(), 4);
        for fout in written.iter() {
            let svg = std::fs::read_to_string(fout).unwrap();
            assert!(svg.contains("Gauge Number 1"));
        }
    }

    #[test]
    fn single_point_gets_a_window() {
        let mut chart = Chart::new("t");
        chart.series.push(crate::chart::Series {
            points: vec![(100., 12.5)],
            style: BARATRON_STYLE,
            legend: None,
        });
        let ((xmin, xmax), (ymin, ymax)) = data_ranges(&chart).unwrap();
        assert!(xmin < 100. && xmax > 100.);
        assert!(ymin < 12.5 && ymax > 12.5);
    }

    #[test]
    fn output_must_be_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = SvgRenderer::init(file.path(), "run").err().unwrap();
        assert_eq!(err.stage(), "render");
    }

    #[test]
    fn unrendered_chart_fails_finish() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = SvgRenderer::init(dir.path(), "run").unwrap();
        assert_eq!(
            renderer.path_for("Baratron Pressure"),
            dir.path().join("run_baratron_pressure.svg")
        );
        renderer.new_chart("Baratron Pressure").unwrap();
        renderer.set_layout(ChartLayout::default()).unwrap();
        assert!(renderer.new_chart("again").is_err());
        assert!(renderer.finish().is_err());
    }
}
