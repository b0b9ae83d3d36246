//! Runs → summaries and series (in parallel) → cross-seed comparison.

use crate::errors::*;
use crate::setting::Setting;
use crate::sink::TableSink;
use crate::source::{self, RunSource};
use evaluation::table;
use evaluation::{
    AggregatedSeries, ComparativeAnalyzer, Comparison, MarginCdf, PolicyPoint, Run,
    RunAggregate, RunAggregator, SeedPoint, SeriesRecord, SummaryRecord, TailSummary,
    TimeSeriesAggregator,
};
use rayon::prelude::*;
use std::cmp::Ordering;

/// What one run contributes before the cross-seed barrier.
struct RunOutput {
    aggregate: RunAggregate,
    series: Vec<SeriesRecord>,
    entities: Vec<(i64, SummaryRecord)>,
}

fn process(run: &Run, ts: &TimeSeriesAggregator, per_entity: bool) -> RunOutput {
    let aggregator = RunAggregator;
    let entities = if per_entity {
        aggregator
            .aggregate_by_entity(run)
            .into_iter()
            .map(|(entity, agg)| (entity, agg.summary))
            .collect()
    } else {
        Vec::new()
    };
    RunOutput {
        aggregate: aggregator.aggregate(run),
        series: ts.per_run(run),
        entities: entities,
    }
}

/// Orders seeds numerically when both are numbers, textually otherwise.
pub fn seed_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Everything derived from a set of runs.
#[derive(Debug, Default)]
pub struct Report {
    /// One per run, sorted by (policy, seed).
    pub summaries: Vec<SummaryRecord>,
    /// One per (run, entity), when enabled.
    pub entities: Vec<(i64, SummaryRecord)>,
    /// Cross-seed series sorted by (policy, time).
    pub series: Vec<AggregatedSeries>,
    /// Pooled margins per policy.
    pub cdfs: Vec<MarginCdf>,
    /// Tail summary per policy.
    pub tails: Vec<TailSummary>,
    /// Mean / std per (policy, metric).
    pub comparison: Comparison,
    /// Mean energy / success per policy.
    pub policy_points: Vec<PolicyPoint>,
    /// Energy / success per seed with Pareto flags.
    pub seed_points: Vec<SeedPoint>,
}

impl Report {
    /// Discovers, loads and aggregates every log under `setting.results_dir`.
    /// A log that cannot be read is reported and left out.
    pub fn aggregate(setting: &Setting) -> Result<Report> {
        let sources = source::discover(setting)?;
        if sources.is_empty() {
            let what = format!("logs in {}", setting.results_dir);
            let e: Error = ErrorKind::MissingInput(what).into();
            warn!("{}", e);
        }

        let ts = TimeSeriesAggregator::new(setting.bucket_width);
        let outputs = sources
            .par_iter()
            .filter_map(|src: &RunSource| match src.load() {
                Ok(run) => Some(process(&run, &ts, setting.per_entity)),
                Err(e) => {
                    error!("{}: {}", src.path.display(), e);
                    None
                }
            })
            .collect::<Vec<_>>();

        Ok(Report::finish(outputs, &ts))
    }

    /// Aggregates runs that are already in memory.
    pub fn from_runs(runs: &[Run], setting: &Setting) -> Report {
        let ts = TimeSeriesAggregator::new(setting.bucket_width);
        let outputs = runs
            .par_iter()
            .map(|run| process(run, &ts, setting.per_entity))
            .collect::<Vec<_>>();
        Report::finish(outputs, &ts)
    }

    /// Compares summaries read back from a summary table. There are no
    /// series or margins in that case.
    pub fn from_summaries(mut summaries: Vec<SummaryRecord>) -> Report {
        summaries.sort_by(key_order);
        let mut report = Report::default();
        report.compare(summaries);
        report
    }

    fn finish(mut outputs: Vec<RunOutput>, ts: &TimeSeriesAggregator) -> Report {
        // every run is in; cross-seed work starts here
        outputs.sort_by(|a, b| key_order(&a.aggregate.summary, &b.aggregate.summary));

        let mut series = Vec::new();
        let mut entities = Vec::new();
        let mut aggregates = Vec::new();
        for o in outputs {
            series.extend(o.series);
            entities.extend(o.entities);
            aggregates.push(o.aggregate);
        }

        let analyzer = ComparativeAnalyzer::default();
        let cdfs = analyzer.margin_cdfs(&aggregates);
        let mut report = Report {
            series: ts.merge(&series),
            entities: entities,
            tails: analyzer.tails(&cdfs),
            cdfs: cdfs,
            ..Report::default()
        };
        report.compare(aggregates.into_iter().map(|a| a.summary).collect());
        report
    }

    fn compare(&mut self, summaries: Vec<SummaryRecord>) {
        if summaries.is_empty() {
            let e: Error = ErrorKind::EmptyGroup("runs".to_string()).into();
            warn!("{}; nothing to compare", e);
        }
        let analyzer = ComparativeAnalyzer::default();
        self.comparison = analyzer.compare(&summaries);
        for stat in self.comparison.stats.iter().filter(|s| s.n == 0) {
            let e: Error =
                ErrorKind::EmptyGroup(format!("{}/{}", stat.policy, stat.metric)).into();
            debug!("{}", e);
        }
        self.policy_points = analyzer.policy_points(&summaries);
        self.seed_points = analyzer.seed_points(&summaries);
        self.summaries = summaries;

        info!(
            "compared {} runs of {} policies; {} metrics unavailable",
            self.summaries.len(),
            self.policy_points.len(),
            self.comparison.unavailable.len()
        );
    }

    /// Sends the per-run tables (summary, series, tails, CDF and, when
    /// enabled, entity summaries) to `sink`.
    pub fn emit_runs<S: TableSink>(&self, setting: &Setting, sink: &mut S) -> Result<()> {
        let out = &setting.output;
        sink.accept(&out.summary, &table::summary_table(&self.summaries))?;
        sink.accept(&out.timeseries, &table::series_table(&self.series))?;
        sink.accept(&out.tails, &table::tail_table(&self.tails))?;
        sink.accept(&out.margin_cdf, &table::cdf_table(&self.cdfs))?;
        if setting.per_entity {
            sink.accept(&out.entity, &table::entity_table(&self.entities))?;
        }
        Ok(())
    }

    /// Sends the comparison tables to `sink`.
    pub fn emit_comparison<S: TableSink>(&self, setting: &Setting, sink: &mut S) -> Result<()> {
        let out = &setting.output;
        sink.accept(
            &out.comparative,
            &table::comparative_table(&self.comparison.stats),
        )?;
        sink.accept(&out.pareto, &table::pareto_table(&self.seed_points))?;
        sink.accept(
            &out.policy_points,
            &table::policy_point_table(&self.policy_points),
        )?;
        Ok(())
    }

    /// Sends every table to `sink`.
    pub fn emit<S: TableSink>(&self, setting: &Setting, sink: &mut S) -> Result<()> {
        self.emit_runs(setting, sink)?;
        self.emit_comparison(setting, sink)
    }
}

fn key_order(a: &SummaryRecord, b: &SummaryRecord) -> Ordering {
    a.policy
        .cmp(&b.policy)
        .then_with(|| seed_order(&a.seed, &b.seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use evaluation::{CompareMetric, EventRecord, Metric};

    fn run(policy: &str, seed: &str, success: &[f64], energy: f64) -> Run {
        let mut records = success
            .iter()
            .enumerate()
            .map(|(i, &v)| EventRecord::new(i as f64, 1, Metric::TaskSuccess, v, ""))
            .collect::<Vec<_>>();
        records.push(EventRecord::new(0.0, 1, Metric::EnergyConsumption, energy, "CpuOnly"));
        Run::new(policy, seed, records)
    }

    #[test]
    fn test_seed_order() {
        let mut seeds = vec!["10", "2", "b", "1", "a"];
        seeds.sort_by(|a, b| seed_order(a, b));
        assert_eq!(seeds, vec!["1", "2", "10", "a", "b"]);
    }

    #[test]
    fn test_report_does_not_depend_on_run_order() {
        let runs = vec![
            run("Random", "10", &[1.0, 0.0], 4.0),
            run("Intelligent", "2", &[1.0, 1.0], 10.0),
            run("Intelligent", "1", &[1.0, 0.0], 20.0),
            run("Random", "2", &[0.0, 0.0], 1.0),
        ];
        let setting = Setting::default();
        let a = Report::from_runs(&runs, &setting);
        let mut reversed = runs.clone();
        reversed.reverse();
        let b = Report::from_runs(&reversed, &setting);

        assert_eq!(a.summaries, b.summaries);
        assert_eq!(a.series, b.series);
        assert_eq!(a.comparison, b.comparison);
        assert_eq!(a.seed_points, b.seed_points);

        let seeds = a
            .summaries
            .iter()
            .map(|s| (s.policy.as_str(), s.seed.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            seeds,
            vec![
                ("Intelligent", "1"),
                ("Intelligent", "2"),
                ("Random", "2"),
                ("Random", "10"),
            ]
        );
    }

    #[test]
    fn test_efficiency_is_mean_of_seed_ratios() {
        let runs = vec![
            run("Intelligent", "A", &[1.0, 1.0], 10.0),
            run("Intelligent", "B", &[1.0, 0.0], 20.0),
        ];
        let report = Report::from_runs(&runs, &Setting::default());
        let eff = report
            .comparison
            .get("Intelligent", CompareMetric::Efficiency)
            .unwrap();
        assert!((eff.mean.unwrap() - 0.0625).abs() < 1e-12);
    }

    #[test]
    fn test_emit_to_memory() {
        let mut setting = Setting::default();
        setting.per_entity = true;
        let report = Report::from_runs(&[run("Local", "1", &[1.0], 2.0)], &setting);

        let mut sink = MemorySink::default();
        report.emit(&setting, &mut sink).unwrap();
        assert_eq!(sink.tables.len(), 8);

        let summary = sink.get("aggregated_summary.csv").unwrap();
        assert_eq!(summary.cell(0, "Policy"), Some("Local"));
        assert!(summary.column("Overflows").is_none());

        let entity = sink.get("entity_summary.csv").unwrap();
        assert_eq!(entity.cell(0, "Entity"), Some("1"));

        let tails = sink.get("tail_latency.csv").unwrap();
        assert!(tails.is_empty());
    }

    #[test]
    fn test_from_summaries_only_compares() {
        let mut a = SummaryRecord::empty("Local", "2");
        a.success_rate = 0.5;
        let mut b = SummaryRecord::empty("Local", "1");
        b.success_rate = 1.0;
        let report = Report::from_summaries(vec![a, b]);
        assert_eq!(report.summaries[0].seed, "1");
        assert!(report.series.is_empty());
        let success = report
            .comparison
            .get("Local", CompareMetric::SuccessRate)
            .unwrap();
        assert_eq!(success.n, 2);
        assert!(report
            .comparison
            .unavailable
            .contains(&CompareMetric::TotalEnergy));
    }
}
