use log::info;
use std::path::{Path, PathBuf};
pub mod chart;
pub mod error;
pub mod load;
pub mod plot;
pub mod series;
pub mod svg;

pub use chart::{graph_baratron, graph_hippo, ChartRenderer};
pub use error::PressureError;
pub use series::{Gauge, PressureSeries, Reading};
pub use svg::SvgRenderer;

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// canvas of the Baratron chart, width and height in pixels
pub const BARATRON_CANVAS: (u32, u32) = (700, 500);
/// canvas of the HIPPO charts, enlarged to host the legend
pub const HIPPO_CANVAS: (u32, u32) = (1000, 800);
/// fraction of the HIPPO canvas width kept free for the legend
pub const LEGEND_MARGIN: f64 = 0.3;
/// max number of labelled divisions on the time axis, more would overlap
pub const X_DIVISIONS: usize = 3;

/// the default output directory, next to the data file
pub fn default_outdir(source: &Path) -> PathBuf {
    match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Loads the data file and plots all the pressure charts next to it.
pub fn plot_pressure<P: AsRef<Path>>(source: P) -> Result<Vec<PathBuf>, PressureError> {
    let source = source.as_ref();
    plot_pressure_to(source, default_outdir(source))
}

/// Loads the data file, then plots the Baratron chart and the three HIPPO charts
/// as svg files in `outdir`; returns the written files.
pub fn plot_pressure_to<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    outdir: Q,
) -> Result<Vec<PathBuf>, PressureError> {
    let source = source.as_ref();
    let series = PressureSeries::from_csv(source)?;
    let prefix = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut renderer = SvgRenderer::init(outdir.as_ref(), &prefix)?;
    graph_baratron(&mut renderer, &series)?;
    graph_hippo(&mut renderer, &series)?;
    let written = renderer.finish()?;
    info!("plotted {} charts from {} records", written.len(), series.len());
    Ok(written)
}
