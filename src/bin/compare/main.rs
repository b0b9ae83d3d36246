//! This binary takes an existing summary table (one row per run) and writes
//! only the comparative tables: mean / std per metric, Pareto points and
//! policy points.

extern crate offstat;
#[macro_use]
extern crate log;
extern crate structopt;

use offstat::errors::*;
use offstat::summary::read_summary;
use offstat::{logger, CsvSink, Report, Setting};
use std::path::PathBuf;
use structopt::StructOpt;

fn main() {
    logger::init();
    let opt = Opt::from_args();

    if let Err(ref e) = run(opt) {
        error!("{}", e);
        for cause in e.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        ::std::process::exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    let mut setting = Setting::load(&opt.setting)?;
    if let Some(dir) = opt.output_dir {
        setting.output_dir = dir;
    }

    let input = match opt.summary {
        Some(path) => PathBuf::from(path),
        None => setting.output_path(&setting.output.summary),
    };
    let summaries = read_summary(&input)?;

    let report = Report::from_summaries(summaries);
    for metric in &report.comparison.unavailable {
        info!("{} unavailable in {}", metric, input.display());
    }
    let mut sink = CsvSink::new(&setting)?;
    report.emit_comparison(&setting, &mut sink)?;
    Ok(())
}

#[derive(StructOpt, Debug)]
#[structopt(name = "compare")]
#[structopt(about = "Compare policies from a pre-computed summary table.")]
struct Opt {
    /// The summary table; defaults to the summary output of the setting.
    #[structopt(help = "Summary CSV")]
    summary: Option<String>,

    /// The setting file; defaults apply when it does not exist.
    #[structopt(short = "c", long = "setting", default_value = "Setting.toml")]
    setting: String,

    /// Output directory for the tables.
    #[structopt(short = "o", long = "out")]
    output_dir: Option<String>,
}
