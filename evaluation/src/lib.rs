//! Library of functions and structs to reduce vehicular task-offloading logs
//! into per-run summaries, time series, and cross-policy comparisons.
//!
//! Every stage is a pure function of its input: the same records in any order
//! produce the same output.

#![deny(missing_docs)]

extern crate average;
extern crate itertools;
#[macro_use]
extern crate log;
#[cfg(test)]
extern crate rand;

mod record;
pub use record::EventRecord;
pub use record::Metric;
pub use record::Parsed;

pub mod stat;
pub use stat::MeanStd;

mod run;
pub use run::Run;
pub use run::RunAggregate;
pub use run::RunAggregator;
pub use run::SummaryRecord;

mod series;
pub use series::AggregatedSeries;
pub use series::SeriesMetric;
pub use series::SeriesRecord;
pub use series::TimeSeriesAggregator;

mod cdf;
pub use cdf::EmpiricalCdf;
pub use cdf::TailSummary;

mod pareto;
pub use pareto::Point;
pub use pareto::Pool;

mod compare;
pub use compare::ComparativeAnalyzer;
pub use compare::ComparativeStat;
pub use compare::CompareMetric;
pub use compare::Comparison;
pub use compare::MarginCdf;
pub use compare::PolicyPoint;
pub use compare::SeedPoint;

pub mod table;
pub use table::Table;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_pareto() {
        let mut runs = Vec::new();
        for &(seed, energy, success) in &[("1", 1.0, 0.5), ("2", 2.0, 0.4), ("3", 3.0, 0.9)] {
            let mut s = SummaryRecord::empty("Random", seed);
            s.success_rate = success;
            s.total_energy_cpu = Some(energy);
            runs.push(s);
        }
        let points = ComparativeAnalyzer::default().seed_points(&runs);

        let optimal = points
            .iter()
            .filter(|p| p.optimal)
            .map(|p| p.seed.as_str())
            .collect::<Vec<_>>();
        assert_eq!(vec!["1", "3"], optimal);
    }

    #[test]
    fn run_to_tables() {
        let records = vec![
            EventRecord::new(0.1, 1, Metric::TaskSuccess, 1.0, ""),
            EventRecord::new(0.2, 1, Metric::EnergyConsumption, 2.0, "CpuOnly"),
            EventRecord::new(0.2, 1, Metric::QueueSizeDecision, 3.0, ""),
            EventRecord::new(0.3, 1, Metric::BatteryRemaining, 90.0, ""),
        ];
        let run = Run::new("Local", "1", records);
        let aggregate = RunAggregator.aggregate(&run);
        let ts = TimeSeriesAggregator::new(0.5);
        let series = ts.merge(&ts.per_run(&run));

        let summary = table::summary_table(&[aggregate.summary.clone()]);
        assert_eq!(summary.cell(0, "SuccessRate"), Some("1"));
        assert_eq!(summary.cell(0, "TotalEnergyCPU"), Some("2"));

        let series = table::series_table(&series);
        assert_eq!(series.len(), 1);
        assert_eq!(series.cell(0, "AvgSuccess"), Some("1"));
        assert_eq!(series.cell(0, "Seeds"), Some("1"));

        let cmp = ComparativeAnalyzer::default().compare(&[aggregate.summary]);
        let efficiency = cmp.get("Local", CompareMetric::Efficiency).unwrap();
        assert_eq!(efficiency.mean, Some(0.5));
    }
}
