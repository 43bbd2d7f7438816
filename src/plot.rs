use super::VERSION;
use clap::{App, Arg};
use std::path::PathBuf;

/// Takes the CLI arguments that control the plotting of the pressure time series.
pub fn parse_cli() -> (PathBuf, PathBuf, bool) {
    let arg_csvin = Arg::with_name("input_csvfile")
        .help("name of the csv data file with the pressure readings")
        .short("f")
        .long("file")
        .takes_value(true)
        .required(true);
    let arg_outdir = Arg::with_name("output_dir")
        .help("directory for the svg charts, defaults to the directory of the data file")
        .short("o")
        .long("outdir")
        .takes_value(true);
    let arg_verbose = Arg::with_name("verbose")
        .help("print every loaded record")
        .short("v")
        .long("verbose")
        .takes_value(false)
        .required(false);
    let cli_args = App::new("pressure_plot")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot the Baratron and HIPPO pressure time series")
        .arg(arg_csvin)
        .arg(arg_outdir)
        .arg(arg_verbose)
        .get_matches();
    let csvin = PathBuf::from(cli_args.value_of("input_csvfile").unwrap_or_default());
    let outdir = match cli_args.value_of("output_dir") {
        Some(p) => PathBuf::from(p),
        None => super::default_outdir(&csvin),
    };
    let verbose = cli_args.is_present("verbose");
    return (csvin, outdir, verbose);
}
