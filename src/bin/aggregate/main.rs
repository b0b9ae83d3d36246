//! This binary reads every simulator log under the results directory and
//! writes the per-run summary, the cross-seed time series and the comparative
//! tables.

extern crate offstat;
#[macro_use]
extern crate log;
extern crate structopt;

use offstat::errors::*;
use offstat::{logger, CsvSink, Report, Setting};
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
    if let Some(dir) = opt.input_dir {
        setting.results_dir = dir;
    }
    if let Some(dir) = opt.output_dir {
        setting.output_dir = dir;
    }
    if opt.per_entity {
        setting.per_entity = true;
    }
    debug!("{:?}", setting);

    let report = Report::aggregate(&setting)?;
    let mut sink = CsvSink::new(&setting)?;
    report.emit(&setting, &mut sink)?;
    info!("wrote {} tables to {}", sink.written().len(), setting.output_dir);
    Ok(())
}

#[derive(StructOpt, Debug)]
#[structopt(name = "aggregate")]
#[structopt(about = "Aggregate offloading simulator logs into comparative tables.")]
struct Opt {
    /// The setting file; defaults apply when it does not exist.
    #[structopt(short = "c", long = "setting", default_value = "Setting.toml")]
    setting: String,

    /// The folder that contains the simulator logs.
    #[structopt(short = "i", long = "input")]
    input_dir: Option<String>,

    /// Output directory for the tables.
    #[structopt(short = "o", long = "out")]
    output_dir: Option<String>,

    /// Also write per-entity summaries.
    #[structopt(long = "per-entity")]
    per_entity: bool,
}
