use crate::error::PressureError;
use crate::series::{Gauge, PressureSeries, Reading};
use crate::{BARATRON_CANVAS, DT_FORMAT, HIPPO_CANVAS, LEGEND_MARGIN, X_DIVISIONS};

pub const BARATRON_TITLE: &str = "Baratron Pressure";
pub const X_LABEL: &str = "Timestamp";
pub const Y_LABEL: &str = "Pressure [mbar]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerShape {
    Circle,
    Square,
    TriangleUp,
    TriangleDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerColor {
    Black,
    Red,
    Green,
    Blue,
}

/// Line and marker style of one series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesStyle {
    pub shape: MarkerShape,
    pub color: MarkerColor,
}

pub const BARATRON_STYLE: SeriesStyle = SeriesStyle {
    shape: MarkerShape::Circle,
    color: MarkerColor::Black,
};

/// fixed style of each HIPPO gauge
pub fn gauge_style(gauge: Gauge) -> SeriesStyle {
    let (shape, color) = match gauge.number() {
        1 => (MarkerShape::Circle, MarkerColor::Black),
        2 => (MarkerShape::Square, MarkerColor::Red),
        3 => (MarkerShape::TriangleUp, MarkerColor::Green),
        _ => (MarkerShape::TriangleDown, MarkerColor::Blue),
    };
    SeriesStyle { shape, color }
}

pub fn gauge_label(gauge: Gauge) -> String {
    format!("Gauge Number {}", gauge.number())
}

pub fn hippo_title(reading: Reading) -> String {
    match reading {
        Reading::Ionization => "HIPPO Ionization Gauge Pressure".to_string(),
        r => format!("HIPPO Convection Gauge {} Pressure", r.index()),
    }
}

/// Canvas geometry of a chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    /// width, height in pixels
    pub size: (u32, u32),
    /// fraction of the width reserved on the right for the legend
    pub legend_margin: f64,
    /// max number of labelled divisions on the time axis
    pub x_divisions: usize,
}

impl Default for ChartLayout {
    fn default() -> ChartLayout {
        ChartLayout {
            size: BARATRON_CANVAS,
            legend_margin: 0.,
            x_divisions: X_DIVISIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// (seconds since the unix epoch, value)
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
    pub legend: Option<String>,
}

/// Everything a backend needs to draw one chart
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub layout: ChartLayout,
    pub x_label: String,
    pub y_label: String,
    pub time_format: String,
    pub series: Vec<Series>,
}

impl Chart {
    pub fn new(title: &str) -> Chart {
        Chart {
            title: title.to_string(),
            layout: ChartLayout::default(),
            x_label: String::new(),
            y_label: String::new(),
            time_format: DT_FORMAT.to_string(),
            series: Vec::new(),
        }
    }

    pub fn legend_entries(&self) -> Vec<(&str, SeriesStyle)> {
        self.series
            .iter()
            .filter_map(|s| s.legend.as_deref().map(|l| (l, s.style)))
            .collect()
    }

    /// all the plotted points, skipping non finite values
    pub fn finite_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
    }
}

/// A charting backend, driven one chart at a time:
/// `new_chart`, then the setters and series, then `render`.
pub trait ChartRenderer {
    /// chart under construction, if any.
    /// Hook for the default operations below; callers build charts through those instead.
    fn current(&mut self) -> Option<&mut Chart>;

    fn new_chart(&mut self, title: &str) -> Result<(), PressureError>;

    /// draws the current chart and closes it
    fn render(&mut self) -> Result<(), PressureError>;

    fn chart(&mut self) -> Result<&mut Chart, PressureError> {
        self.current()
            .ok_or_else(|| PressureError::render("<none>", "no chart started"))
    }

    fn set_layout(&mut self, layout: ChartLayout) -> Result<(), PressureError> {
        self.chart()?.layout = layout;
        Ok(())
    }

    fn set_axis_label(&mut self, axis: Axis, text: &str) -> Result<(), PressureError> {
        let chart = self.chart()?;
        match axis {
            Axis::X => chart.x_label = text.to_string(),
            Axis::Y => chart.y_label = text.to_string(),
        }
        Ok(())
    }

    fn set_time_axis_format(&mut self, pattern: &str) -> Result<(), PressureError> {
        self.chart()?.time_format = pattern.to_string();
        Ok(())
    }

    fn add_series(&mut self, points: Vec<(f64, f64)>, style: SeriesStyle) -> Result<(), PressureError> {
        self.chart()?.series.push(Series {
            points,
            style,
            legend: None,
        });
        Ok(())
    }

    /// labels the last added series
    fn add_legend_entry(&mut self, label: &str) -> Result<(), PressureError> {
        let chart = self.chart()?;
        let title = chart.title.clone();
        match chart.series.last_mut() {
            Some(s) => {
                s.legend = Some(label.to_string());
                Ok(())
            }
            None => Err(PressureError::render(title, "legend entry without a series")),
        }
    }
}

fn time_axes<R: ChartRenderer + ?Sized>(renderer: &mut R, layout: ChartLayout) -> Result<(), PressureError> {
    renderer.set_layout(layout)?;
    renderer.set_axis_label(Axis::X, X_LABEL)?;
    renderer.set_axis_label(Axis::Y, Y_LABEL)?;
    renderer.set_time_axis_format(DT_FORMAT)
}

/// the single series chart of the Baratron reference gauge
pub fn graph_baratron<R: ChartRenderer + ?Sized>(
    renderer: &mut R,
    series: &PressureSeries,
) -> Result<(), PressureError> {
    renderer.new_chart(BARATRON_TITLE)?;
    time_axes(renderer, ChartLayout::default())?;
    renderer.add_series(series.baratron_points(), BARATRON_STYLE)?;
    renderer.render()
}

/// one chart per reading, each comparing the four HIPPO gauges
pub fn graph_hippo<R: ChartRenderer + ?Sized>(
    renderer: &mut R,
    series: &PressureSeries,
) -> Result<(), PressureError> {
    let layout = ChartLayout {
        size: HIPPO_CANVAS,
        legend_margin: LEGEND_MARGIN,
        x_divisions: X_DIVISIONS,
    };
    for &reading in Reading::ALL.iter() {
        renderer.new_chart(&hippo_title(reading))?;
        time_axes(renderer, layout)?;
        for &gauge in Gauge::ALL.iter() {
            renderer.add_series(series.hippo_points(gauge, reading), gauge_style(gauge))?;
            renderer.add_legend_entry(&gauge_label(gauge))?;
        }
        renderer.render()?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::series::{HippoGrid, PressureRecord};
    use std::collections::HashSet;

    /// keeps the rendered charts instead of drawing them
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub current: Option<Chart>,
        pub charts: Vec<Chart>,
    }

    impl ChartRenderer for Recorder {
        fn current(&mut self) -> Option<&mut Chart> {
            self.current.as_mut()
        }

        fn new_chart(&mut self, title: &str) -> Result<(), PressureError> {
            self.current = Some(Chart::new(title));
            Ok(())
        }

        fn render(&mut self) -> Result<(), PressureError> {
            let chart = self
                .current
                .take()
                .ok_or_else(|| PressureError::render("<none>", "no chart started"))?;
            self.charts.push(chart);
            Ok(())
        }
    }

    fn render_all(series: &PressureSeries) -> Vec<Chart> {
        let mut recorder = Recorder::default();
        graph_baratron(&mut recorder, series).unwrap();
        graph_hippo(&mut recorder, series).unwrap();
        assert!(recorder.current.is_none());
        recorder.charts
    }

    fn single_record() -> PressureSeries {
        let mut hippo = HippoGrid::default();
        hippo.set(Gauge::new(2).unwrap(), Reading::Convection1, 7.0);
        let mut series = PressureSeries::new(1);
        series.push(&PressureRecord {
            time: 1609459200.,
            baratron: 12.5,
            hippo,
        });
        series
    }

    #[test]
    fn titles_and_legends_are_exact() {
        let charts = render_all(&PressureSeries::new(0));
        let titles: Vec<&str> = charts.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Baratron Pressure",
                "HIPPO Ionization Gauge Pressure",
                "HIPPO Convection Gauge 1 Pressure",
                "HIPPO Convection Gauge 2 Pressure",
            ]
        );
        assert!(charts[0].legend_entries().is_empty());
        for chart in &charts[1..] {
            let labels: Vec<&str> = chart.legend_entries().iter().map(|(l, _)| *l).collect();
            assert_eq!(
                labels,
                vec!["Gauge Number 1", "Gauge Number 2", "Gauge Number 3", "Gauge Number 4"]
            );
            assert_eq!(chart.layout.legend_margin, LEGEND_MARGIN);
        }
        for chart in &charts {
            assert_eq!(chart.x_label, "Timestamp");
            assert_eq!(chart.y_label, "Pressure [mbar]");
            assert_eq!(chart.time_format, "%Y-%m-%d %H:%M:%S");
            assert_eq!(chart.layout.x_divisions, 3);
        }
    }

    #[test]
    fn empty_series_give_empty_charts() {
        let charts = render_all(&PressureSeries::new(0));
        assert_eq!(charts.len(), 4);
        assert_eq!(charts[0].series.len(), 1);
        for chart in &charts[1..] {
            assert_eq!(chart.series.len(), 4);
        }
        assert!(charts.iter().all(|c| c.finite_points().next().is_none()));
    }

    #[test]
    fn single_record_values() {
        let charts = render_all(&single_record());
        assert_eq!(charts[0].series[0].points, vec![(1609459200., 12.5)]);
        // reading 1 chart, gauge 2 series
        let gauge2 = &charts[2].series[1];
        assert_eq!(gauge2.legend.as_deref(), Some("Gauge Number 2"));
        assert_eq!(gauge2.points, vec![(1609459200., 7.0)]);
    }

    #[test]
    fn time_axis_follows_input() {
        let mut series = PressureSeries::new(4);
        let times = [1609459200., 1609459260., 1609459320., 1609462800.];
        for &t in times.iter() {
            series.push(&PressureRecord {
                time: t,
                baratron: 1.,
                hippo: HippoGrid::default(),
            });
        }
        for chart in render_all(&series) {
            for s in &chart.series {
                let xs: Vec<f64> = s.points.iter().map(|p| p.0).collect();
                assert_eq!(xs, times.to_vec());
                assert!(xs.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn gauge_styles_are_distinct_and_stable() {
        let styles: Vec<SeriesStyle> = Gauge::ALL.iter().map(|&g| gauge_style(g)).collect();
        let shapes: HashSet<MarkerShape> = styles.iter().map(|s| s.shape).collect();
        let colors: HashSet<MarkerColor> = styles.iter().map(|s| s.color).collect();
        assert_eq!(shapes.len(), 4);
        assert_eq!(colors.len(), 4);
        let first = render_all(&single_record());
        let second = render_all(&single_record());
        assert_eq!(first, second);
        for chart in &first[1..] {
            let drawn: Vec<SeriesStyle> = chart.series.iter().map(|s| s.style).collect();
            assert_eq!(drawn, styles);
        }
    }

    #[test]
    fn misuse_is_a_render_failure() {
        let mut recorder = Recorder::default();
        let err = recorder.add_series(vec![], BARATRON_STYLE).unwrap_err();
        assert_eq!(err.stage(), "render");
        recorder.new_chart("x").unwrap();
        assert!(recorder.add_legend_entry("Gauge Number 1").is_err());
    }
}
