//! Time-bucketed series: per-run bucketing, then cross-seed averaging.
//!
//! A bucket is identified by its integer index `floor(time / width)`; the
//! reported time is `index * width`. Buckets without records are never
//! emitted, and a seed without data in a bucket does not take part in that
//! bucket's average.

use super::record::Metric;
use super::run::Run;
use super::stat;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

/// The time-varying metrics that are bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesMetric {
    /// `QueueSize_Decision`
    QueueSize,
    /// `QueueSize_Processing`
    QueueProc,
    /// `BatteryRemaining`
    Battery,
    /// `TaskSuccess`
    Success,
}

impl SeriesMetric {
    /// Every bucketed metric, in column order.
    pub fn all() -> [SeriesMetric; 4] {
        [
            SeriesMetric::QueueSize,
            SeriesMetric::QueueProc,
            SeriesMetric::Battery,
            SeriesMetric::Success,
        ]
    }

    /// Maps a raw metric to its series, if it has one.
    pub fn from_metric(metric: &Metric) -> Option<SeriesMetric> {
        match *metric {
            Metric::QueueSizeDecision => Some(SeriesMetric::QueueSize),
            Metric::QueueSizeProcessing => Some(SeriesMetric::QueueProc),
            Metric::BatteryRemaining => Some(SeriesMetric::Battery),
            Metric::TaskSuccess => Some(SeriesMetric::Success),
            _ => None,
        }
    }
}

/// Mean value per metric of one run within one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRecord {
    /// Policy label.
    pub policy: String,
    /// Seed identifier.
    pub seed: String,
    /// Bucket index.
    pub bucket: i64,
    /// Bucket start time in seconds.
    pub time: f64,
    /// Mean decision queue length.
    pub avg_queue_size: Option<f64>,
    /// Mean processing queue length.
    pub avg_queue_proc: Option<f64>,
    /// Mean remaining battery.
    pub avg_battery: Option<f64>,
    /// Fraction of tasks succeeding in this bucket.
    pub avg_success: Option<f64>,
}

impl SeriesRecord {
    fn new(policy: &str, seed: &str, bucket: i64, time: f64) -> SeriesRecord {
        SeriesRecord {
            policy: policy.to_string(),
            seed: seed.to_string(),
            bucket: bucket,
            time: time,
            avg_queue_size: None,
            avg_queue_proc: None,
            avg_battery: None,
            avg_success: None,
        }
    }

    /// Value of one series metric.
    pub fn get(&self, metric: SeriesMetric) -> Option<f64> {
        match metric {
            SeriesMetric::QueueSize => self.avg_queue_size,
            SeriesMetric::QueueProc => self.avg_queue_proc,
            SeriesMetric::Battery => self.avg_battery,
            SeriesMetric::Success => self.avg_success,
        }
    }

    fn set(&mut self, metric: SeriesMetric, value: Option<f64>) {
        match metric {
            SeriesMetric::QueueSize => self.avg_queue_size = value,
            SeriesMetric::QueueProc => self.avg_queue_proc = value,
            SeriesMetric::Battery => self.avg_battery = value,
            SeriesMetric::Success => self.avg_success = value,
        }
    }
}

/// Cross-seed average of one policy within one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSeries {
    /// Policy label.
    pub policy: String,
    /// Bucket index.
    pub bucket: i64,
    /// Bucket start time in seconds.
    pub time: f64,
    /// Mean over the seeds that observed the decision queue.
    pub avg_queue_size: Option<f64>,
    /// Mean over the seeds that observed the processing queue.
    pub avg_queue_proc: Option<f64>,
    /// Mean over the seeds that observed the battery.
    pub avg_battery: Option<f64>,
    /// Mean over the seeds that finished a task in this bucket.
    pub avg_success: Option<f64>,
    /// Seeds with any data in this bucket.
    pub seeds: usize,
}

impl AggregatedSeries {
    /// Value of one series metric.
    pub fn get(&self, metric: SeriesMetric) -> Option<f64> {
        match metric {
            SeriesMetric::QueueSize => self.avg_queue_size,
            SeriesMetric::QueueProc => self.avg_queue_proc,
            SeriesMetric::Battery => self.avg_battery,
            SeriesMetric::Success => self.avg_success,
        }
    }
}

/// Buckets time-varying metrics with a fixed width.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesAggregator {
    width: f64,
}

impl TimeSeriesAggregator {
    /// Creates an aggregator with bucket `width` in seconds.
    pub fn new(width: f64) -> Self {
        assert!(width.is_finite() && width > 0.0, "bucket width must be positive");
        TimeSeriesAggregator { width: width }
    }

    /// Index of the bucket holding `time`; `None` for an unusable time.
    pub fn bucket_of(&self, time: f64) -> Option<i64> {
        if time.is_finite() {
            Some((time / self.width).floor() as i64)
        } else {
            None
        }
    }

    /// Start time of bucket `index`.
    pub fn bucket_time(&self, index: i64) -> f64 {
        index as f64 * self.width
    }

    /// Stage 1: the mean of each series metric per bucket for one run,
    /// ascending in time.
    pub fn per_run(&self, run: &Run) -> Vec<SeriesRecord> {
        let mut skipped = 0;
        let groups = run
            .records
            .iter()
            .filter_map(|r| {
                let metric = SeriesMetric::from_metric(&r.metric)?;
                match self.bucket_of(r.time) {
                    Some(bucket) => Some(((bucket, metric), r.value)),
                    None => {
                        skipped += 1;
                        None
                    }
                }
            })
            .into_group_map();
        if skipped > 0 {
            debug!(
                "{}/{}: {} series records without a usable time",
                run.policy, run.seed, skipped
            );
        }

        let mut rows: BTreeMap<i64, SeriesRecord> = BTreeMap::new();
        for ((bucket, metric), values) in groups {
            let time = self.bucket_time(bucket);
            rows.entry(bucket)
                .or_insert_with(|| SeriesRecord::new(&run.policy, &run.seed, bucket, time))
                .set(metric, stat::mean(values));
        }
        rows.into_iter().map(|(_, row)| row).collect()
    }

    /// Stage 2: averages the per-run records of every (policy, bucket) over
    /// the seeds that have a value, sorted by (policy, time).
    pub fn merge(&self, records: &[SeriesRecord]) -> Vec<AggregatedSeries> {
        let mut groups: BTreeMap<(&str, i64), Vec<&SeriesRecord>> = BTreeMap::new();
        for r in records {
            groups
                .entry((r.policy.as_str(), r.bucket))
                .or_insert_with(Vec::new)
                .push(r);
        }

        groups
            .into_iter()
            .map(|((policy, bucket), group)| {
                let seeds = group
                    .iter()
                    .map(|r| r.seed.as_str())
                    .collect::<BTreeSet<_>>()
                    .len();
                let avg = |metric: SeriesMetric| stat::mean(group.iter().filter_map(|r| r.get(metric)));
                AggregatedSeries {
                    policy: policy.to_string(),
                    bucket: bucket,
                    time: self.bucket_time(bucket),
                    avg_queue_size: avg(SeriesMetric::QueueSize),
                    avg_queue_proc: avg(SeriesMetric::QueueProc),
                    avg_battery: avg(SeriesMetric::Battery),
                    avg_success: avg(SeriesMetric::Success),
                    seeds: seeds,
                }
            })
            .collect()
    }
}
