extern crate csv;
extern crate evaluation;
extern crate offstat;
extern crate tempfile;

use evaluation::CompareMetric;
use offstat::summary::read_summary;
use offstat::{CsvSink, Report, Setting};
use std::fs;
use std::path::Path;

const LOCAL_1: &str = "\
Time,EntityID,Metric,Value,Tag,TaskID,Location
0.10,1,TaskSuccess,1,,1,Vehicle
0.20,1,TaskSuccess,1,,2,Vehicle
0.10,1,TaskLatency,0.05,,1,Vehicle
0.20,1,TaskLatency,0.15,,2,Vehicle
0.10,1,TaskMargin,0.1,,1,Vehicle
0.20,1,TaskMargin,-0.05,,2,Vehicle
0.10,1,EnergyConsumption,2.0,CpuOnly,1,Vehicle
0.10,1,QueueSize_Decision,2,,,Vehicle
";

const LOCAL_2: &str = "\
Time,EntityID,Metric,Value,Tag,TaskID,Location
0.10,1,TaskSuccess,1,,1,Vehicle
0.30,1,TaskSuccess,0,,2,Vehicle
0.10,1,EnergyConsumption,4.0,CpuOnly,1,Vehicle
0.10,1,QueueSize_Decision,4,,,Vehicle
1.20,1,QueueSize_Decision,6,,,Vehicle
";

const INTELLIGENT_7: &str = "\
0.10,1,TaskSuccess,1,,1,Vehicle
0.10,1,EnergyConsumption,1.0,CpuOnly,1,Vehicle
0.10,1,EnergyConsumption,0.5,TxOnly,1,Vehicle
0.05,1,OffloadingType,1,Remote | t1,1,Vehicle
0.20,2,TaskMargin,0.3,,4,Vehicle
";

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn read_table(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let header = rdr.headers().unwrap().iter().map(String::from).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (header, rows)
}

fn setting(results: &Path) -> Setting {
    let mut setting = Setting::default();
    setting.results_dir = results.display().to_string();
    setting.output_dir = results.join("out").display().to_string();
    setting
}

fn populate(dir: &Path) {
    write(dir, "local_1.csv", LOCAL_1);
    write(dir, "local_2.csv", LOCAL_2);
    write(dir, "intelligent_run_7.csv", INTELLIGENT_7);
    write(dir, "aggregated_summary.csv", "Policy,Seed\nStale,0\n");
    write(dir, "unknown_3.csv", LOCAL_1);
    write(dir, "notes.txt", "not a log");
}

#[test]
fn aggregate_writes_all_tables() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path());
    let setting = setting(dir.path());

    let report = Report::aggregate(&setting).unwrap();
    let mut sink = CsvSink::new(&setting).unwrap();
    report.emit(&setting, &mut sink).unwrap();
    assert_eq!(sink.written().len(), 7);

    let out = dir.path().join("out");
    let (header, rows) = read_table(&out.join("aggregated_summary.csv"));
    assert_eq!(rows.len(), 3);
    assert!(!header.contains(&"Overflows".to_string()));
    assert!(!header.contains(&"AvgTransferTime".to_string()));
    assert!(header.contains(&"P95Latency".to_string()));
    assert_eq!(rows[0][0], "Intelligent");
    assert_eq!(rows[0][1], "7");
    assert_eq!(rows[1][1], "1");
    assert_eq!(rows[2][1], "2");

    let (header, rows) = read_table(&out.join("aggregated_timeseries.csv"));
    assert!(!header.contains(&"AvgQueueProc".to_string()));
    let col = |name: &str| header.iter().position(|h| h == name).unwrap();
    let local = rows
        .iter()
        .filter(|r| r[col("Policy")] == "Local")
        .collect::<Vec<_>>();
    assert_eq!(local.len(), 2);
    assert_eq!(local[0][col("Time")], "0");
    assert_eq!(local[0][col("AvgQueueSize")], "3");
    assert_eq!(local[0][col("Seeds")], "2");
    assert_eq!(local[1][col("Time")], "1");
    assert_eq!(local[1][col("AvgQueueSize")], "6");
    assert_eq!(local[1][col("Seeds")], "1");

    let (_, rows) = read_table(&out.join("tail_latency.csv"));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], "Local");
    assert_eq!(rows[1][2], "0.5");

    let (header, rows) = read_table(&out.join("pareto.csv"));
    assert_eq!(header, vec!["Policy", "Seed", "Energy", "SuccessRate", "Optimal"]);
    assert_eq!(rows.len(), 3);
}

#[test]
fn compare_from_written_summary_matches() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path());
    let setting = setting(dir.path());

    let report = Report::aggregate(&setting).unwrap();
    let mut sink = CsvSink::new(&setting).unwrap();
    report.emit_runs(&setting, &mut sink).unwrap();

    let summaries = read_summary(setting.output_path(&setting.output.summary)).unwrap();
    let reread = Report::from_summaries(summaries);
    assert_eq!(reread.comparison, report.comparison);
    assert_eq!(reread.seed_points, report.seed_points);

    let efficiency = reread
        .comparison
        .get("Intelligent", CompareMetric::Efficiency)
        .unwrap();
    assert!((efficiency.mean.unwrap() - 1.0 / 1.5).abs() < 1e-12);
    assert!(reread
        .comparison
        .unavailable
        .contains(&CompareMetric::Overflows));
}

#[test]
fn missing_results_dir_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let setting = setting(&dir.path().join("absent"));
    assert!(Report::aggregate(&setting).is_err());
}
