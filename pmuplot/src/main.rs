mod csv_log;
mod plot;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{builder::PossibleValuesParser, CommandFactory, FromArgMatches, Parser};
use pmu::{
    catalog::{self, PlatformCatalog},
    cpu_family,
    series::{self, DerivedSeries},
    PerfStatDriver, StatDefinition,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Measure a ratio of two PMU counters over time")]
struct Cli {
    /// Stat to measure, one of the host platform's catalog entries
    #[arg(long, default_value = "ipc")]
    stat: String,
    /// Sampling period in milliseconds
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    period: u64,
    /// Comma separated CPU ids, or `all`
    #[arg(long = "cpu-list", value_parser = parse_cpu_list)]
    cpu_list: Option<CpuList>,
    /// Do not plot to terminal
    #[arg(long)]
    no_plot: bool,
    /// Save counter data as CSV to specified file
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// How long to measure for in seconds
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    time: u64,
    /// Custom counter ratio as 'name|ctr1|ctr2|scale', calculated as ctr1/ctr2 * scale
    #[arg(long = "custom_ctr")]
    custom_ctr: Option<StatDefinition>,
    /// Allow running without root privileges
    #[arg(long)]
    no_root: bool,
    /// Print the stats available on this platform and exit
    #[arg(long)]
    list_stats: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum CpuList {
    All,
    Ids(Vec<u32>),
}

impl CpuList {
    fn into_ids(self) -> Option<Vec<u32>> {
        match self {
            CpuList::All => None,
            CpuList::Ids(ids) => Some(ids),
        }
    }
}

fn parse_cpu_list(value: &str) -> Result<CpuList, String> {
    if value == "all" {
        return Ok(CpuList::All);
    }

    value
        .split(',')
        .map(|id| {
            id.trim()
                .parse::<u32>()
                .map_err(|_| format!("'{id}' is not a CPU id"))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(CpuList::Ids)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

/// Parses the command line, restricting `--stat` to what `platform` offers.
fn parse_args(platform: &'static PlatformCatalog) -> Cli {
    let command = Cli::command().mut_arg("stat", |arg| {
        arg.value_parser(PossibleValuesParser::new(platform.stat_names()))
    });

    let matches = command.get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

fn main() -> Result<()> {
    init_tracing();

    let platform = match cpu_family::get_host_platform() {
        Ok(platform) => platform,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let Some(catalog) = catalog::find_platform(&platform) else {
        eprintln!("{platform} is not supported");
        std::process::exit(1);
    };

    let args = parse_args(catalog);

    if args.list_stats {
        println!("{}", report::stats_table(catalog));
        return Ok(());
    }

    if !args.no_root && !is_root() {
        eprintln!("Must be run with root privileges (or with --no-root)");
        std::process::exit(1);
    }

    let stat = match args.custom_ctr {
        Some(custom) => custom,
        None => catalog.lookup(&args.stat)?.clone(),
    };

    info!(
        %platform,
        stat = %stat.name,
        numerator = %stat.numerator,
        denominator = %stat.denominator,
        "measuring for {}s",
        args.time
    );

    let driver = PerfStatDriver::builder(&stat)
        .duration_secs(args.time)
        .period_ms(args.period)
        .cpus(args.cpu_list.and_then(CpuList::into_ids))
        .build();

    let Some(output) = driver.run() else {
        return Ok(());
    };

    let samples = series::parse_samples(output.as_bytes())?;
    let series = DerivedSeries::derive(&samples, &stat);
    let summary = series.summary();

    if let Some(path) = &args.log_file {
        csv_log::write_log(path, &series)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
    }

    if args.no_plot {
        println!("{}", report::summary_table(&series, &summary));
    } else {
        plot::print_plot(&series, &summary);
    }

    Ok(())
}
