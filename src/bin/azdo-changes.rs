#[macro_use]
extern crate log;

use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use azdo_changes::{Config, Driver};
use chrono::Local;
use env_logger::Builder;
use failure::{Error, ResultExt};
use log::LevelFilter;
use structopt::StructOpt;

const DEFAULT_CONFIG_FILE: &str = "~/.azdo-changes.toml";

fn main() {
    let args = Args::from_args();

    if args.example_config {
        if let Err(e) = generate_example() {
            report_error(&e);
            process::exit(1);
        }
        return;
    }

    if let Err(e) = run(&args) {
        report_error(&e);
        process::exit(1);
    }
}

fn report_error(e: &Error) {
    eprintln!("Error: {}", e);

    for cause in e.iter_chain().skip(1) {
        eprintln!("\tCaused By: {}", cause);
    }

    let backtrace = e.backtrace().to_string();
    if !backtrace.trim().is_empty() {
        eprintln!("{}", backtrace);
    }
}

fn generate_example() -> Result<(), Error> {
    let example = Config::example();

    println!("{}", example.as_toml()?);
    Ok(())
}

fn run(args: &Args) -> Result<(), Error> {
    initialize_logging(args)?;
    let cfg = args.config()?;

    if log_enabled!(log::Level::Debug) {
        for line in format!("{:#?}", cfg).lines() {
            debug!("{}", line);
        }
    }

    let driver = Driver::with_config(cfg);
    let report = driver.run()?;

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    report.render(&mut stdout)?;
    stdout.flush()?;

    Ok(())
}

#[derive(Debug, Clone, PartialEq, StructOpt)]
#[structopt(about = "Report recent commits across every branch of an Azure DevOps project.")]
struct Args {
    #[structopt(
        short = "c",
        long = "config",
        help = "The configuration file to use (defaults to ~/.azdo-changes.toml, if it exists)."
    )]
    config_file: Option<String>,
    #[structopt(
        short = "v",
        long = "verbose",
        parse(from_occurrences),
        help = "Verbose output (repeat for more verbosity)"
    )]
    verbosity: u64,
    #[structopt(
        long = "example-config",
        help = "Generate an example config and immediately exit."
    )]
    example_config: bool,
}

impl Args {
    pub fn config(&self) -> Result<Config, Error> {
        match self.config_file {
            Some(ref file) => load_config(file),
            None => {
                let default =
                    shellexpand::full(DEFAULT_CONFIG_FILE).context("Unable to expand wildcards")?;

                if Path::new(&*default).exists() {
                    load_config(DEFAULT_CONFIG_FILE)
                } else {
                    info!("No config file found, using the defaults");
                    Ok(Config::default())
                }
            }
        }
    }
}

fn load_config(file: &str) -> Result<Config, Error> {
    let config_file = shellexpand::full(file).context("Unable to expand wildcards")?;

    Config::from_file(&*config_file)
        .context("Couldn't load the config")
        .map_err(Into::into)
}

fn initialize_logging(args: &Args) -> Result<(), Error> {
    let mut builder = Builder::new();

    let level = match args.verbosity {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };

    if let Some(lvl) = level {
        builder.filter(Some("azdo_changes"), lvl);
    }

    if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }

    builder.format(|out, record| {
        let location = match record.line() {
            Some(line) => format!("{}#{}", record.target(), line),
            None => record.target().to_string(),
        };

        writeln!(
            out,
            "{} [{:5}] ({}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            location,
            record.args()
        )
    });

    builder.try_init()?;

    Ok(())
}
