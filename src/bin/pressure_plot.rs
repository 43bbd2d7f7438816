use log::{error, info};
use pressure_plot::plot::parse_cli;
use pressure_plot::plot_pressure_to;

fn main() {
    let (csvin, outdir, verbose) = parse_cli();
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    info!(
        "read data from {} and plot to {}",
        csvin.display(),
        outdir.display()
    );
    match plot_pressure_to(&csvin, &outdir) {
        Ok(written) => {
            for fout in written.iter() {
                println!("{}", fout.display());
            }
        }
        Err(e) => {
            error!("{} failed: {}", e.stage(), e);
            std::process::exit(1);
        }
    }
}
