//! Reduction of one (policy, seed) run into a `SummaryRecord`.

use super::record::{EventRecord, Metric};
use super::stat;
use std::collections::BTreeMap;

/// One (policy, seed) execution: every record of one simulation log.
#[derive(Debug, Clone)]
pub struct Run {
    /// Offloading policy label, e.g. `Intelligent`.
    pub policy: String,

    /// Seed identifier.
    pub seed: String,

    /// All records in log order.
    pub records: Vec<EventRecord>,

    /// How many fields were defaulted while reading the log.
    pub malformed: usize,
}

impl Run {
    /// Creates a run from already parsed records.
    pub fn new(policy: &str, seed: &str, records: Vec<EventRecord>) -> Run {
        Run {
            policy: policy.to_string(),
            seed: seed.to_string(),
            records: records,
            malformed: 0,
        }
    }
}

/// One row per run. Every measured field other than the success rate is
/// `None` when the run never reported the underlying metric.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    /// Policy label.
    pub policy: String,

    /// Seed identifier.
    pub seed: String,

    /// Fraction of successful tasks; NaN when the run has no `TaskSuccess`.
    pub success_rate: f64,

    /// Mean task latency in seconds.
    pub avg_latency: Option<f64>,

    /// Median task latency.
    pub p50_latency: Option<f64>,

    /// 95th percentile task latency.
    pub p95_latency: Option<f64>,

    /// Mean upload time to the RSU.
    pub avg_transfer_time: Option<f64>,

    /// Tasks whose deadline margin was negative.
    pub failures: Option<u64>,

    /// Tasks dropped on a full queue.
    pub overflows: Option<u64>,

    /// Total CPU energy (J).
    pub total_energy_cpu: Option<f64>,

    /// Total transmission energy (J).
    pub total_energy_tx: Option<f64>,

    /// Tasks executed locally.
    pub offload_local: Option<u64>,

    /// Tasks offloaded to an RSU.
    pub offload_remote: Option<u64>,
}

impl SummaryRecord {
    /// A record with nothing measured.
    pub fn empty(policy: &str, seed: &str) -> SummaryRecord {
        SummaryRecord {
            policy: policy.to_string(),
            seed: seed.to_string(),
            success_rate: ::std::f64::NAN,
            avg_latency: None,
            p50_latency: None,
            p95_latency: None,
            avg_transfer_time: None,
            failures: None,
            overflows: None,
            total_energy_cpu: None,
            total_energy_tx: None,
            offload_local: None,
            offload_remote: None,
        }
    }

    /// CPU plus transmission energy. A run that only observed one branch
    /// spent nothing on the other; `None` when neither was observed.
    pub fn total_energy(&self) -> Option<f64> {
        match (self.total_energy_cpu, self.total_energy_tx) {
            (None, None) => None,
            (cpu, tx) => Some(cpu.unwrap_or(0.0) + tx.unwrap_or(0.0)),
        }
    }

    /// Success per joule for this run alone.
    pub fn efficiency(&self) -> Option<f64> {
        let energy = self.total_energy()?;
        if self.success_rate.is_nan() || energy <= 0.0 || !energy.is_finite() {
            return None;
        }
        Some(self.success_rate / energy)
    }
}

/// A run's summary plus the per-task margins kept for tail analysis.
#[derive(Debug, Clone)]
pub struct RunAggregate {
    /// The reduced row.
    pub summary: SummaryRecord,

    /// Every `TaskMargin` value of the run, ascending.
    pub margins: Vec<f64>,
}

/// Offloading branch of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Local,
    Remote,
}

impl Branch {
    /// The branch named in the leading segment of the tag (the part before
    /// `|`; the rest names the policy and may itself mention a branch). The
    /// recorded value decides when that segment names neither.
    fn of(record: &EventRecord) -> Branch {
        let head = record.tag.split('|').next().unwrap_or("").to_lowercase();
        match (head.find("local"), head.find("remote")) {
            (Some(l), Some(r)) if r < l => Branch::Remote,
            (Some(_), _) => Branch::Local,
            (None, Some(_)) => Branch::Remote,
            (None, None) if record.value >= 0.5 => Branch::Remote,
            (None, None) => Branch::Local,
        }
    }
}

/// Reduces runs. Stateless: every call is a pure function of its input.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunAggregator;

impl RunAggregator {
    /// Reduces a whole run.
    pub fn aggregate(&self, run: &Run) -> RunAggregate {
        let records = run.records.iter().collect::<Vec<_>>();
        let aggregate = reduce(&run.policy, &run.seed, &records);
        debug!(
            "{}/{}: {} records, success {:.4}, {} margins",
            run.policy,
            run.seed,
            run.records.len(),
            aggregate.summary.success_rate,
            aggregate.margins.len()
        );
        aggregate
    }

    /// Applies the same reduction to each entity (vehicle) of a run
    /// separately. Entities are returned in ascending id order.
    pub fn aggregate_by_entity(&self, run: &Run) -> Vec<(i64, RunAggregate)> {
        let mut by_entity: BTreeMap<i64, Vec<&EventRecord>> = BTreeMap::new();
        for r in &run.records {
            by_entity.entry(r.entity_id).or_insert_with(Vec::new).push(r);
        }
        by_entity
            .into_iter()
            .map(|(entity, records)| (entity, reduce(&run.policy, &run.seed, &records)))
            .collect()
    }
}

fn reduce(policy: &str, seed: &str, records: &[&EventRecord]) -> RunAggregate {
    let values = |metric: Metric| {
        records
            .iter()
            .filter(|r| r.metric == metric)
            .map(|r| r.value)
            .collect::<Vec<f64>>()
    };
    let count = |metric: Metric| {
        let n = records.iter().filter(|r| r.metric == metric).count() as u64;
        if n == 0 {
            None
        } else {
            Some(n)
        }
    };

    let mut summary = SummaryRecord::empty(policy, seed);

    summary.success_rate = stat::mean(values(Metric::TaskSuccess)).unwrap_or(::std::f64::NAN);

    let latencies = stat::canonical(values(Metric::TaskLatency));
    summary.avg_latency = stat::mean(latencies.iter().cloned());
    summary.p50_latency = stat::nearest_rank(&latencies, 0.50);
    summary.p95_latency = stat::nearest_rank(&latencies, 0.95);

    summary.avg_transfer_time = stat::mean(values(Metric::TransferTime));

    let (cpu, tx) = energy(records);
    summary.total_energy_cpu = stat::sum(cpu);
    summary.total_energy_tx = stat::sum(tx);

    let margins = stat::canonical(values(Metric::TaskMargin));
    if !margins.is_empty() {
        summary.failures = Some(margins.iter().filter(|&&m| m < 0.0).count() as u64);
    }

    summary.overflows = count(Metric::FullQueueError);

    if let Some((local, remote)) = offloading(records) {
        summary.offload_local = Some(local);
        summary.offload_remote = Some(remote);
    }

    RunAggregate {
        summary: summary,
        margins: margins,
    }
}

/// Splits energy records into (cpu, tx) values. Energy is additive, so the
/// caller sums these rather than averaging them.
fn energy(records: &[&EventRecord]) -> (Vec<f64>, Vec<f64>) {
    let mut cpu = Vec::new();
    let mut tx = Vec::new();
    for r in records {
        match r.metric {
            Metric::EnergyConsumption if r.tag_contains("tx") => tx.push(r.value),
            Metric::EnergyConsumption | Metric::TotalEnergyCpu => cpu.push(r.value),
            Metric::TotalEnergyTx => tx.push(r.value),
            _ => {}
        }
    }
    (cpu, tx)
}

/// Counts (local, remote) tasks, each task once. Records carrying a task id
/// are deduplicated by it; the branch recorded last (by time, then branch) is
/// kept so the result does not depend on input order.
fn offloading(records: &[&EventRecord]) -> Option<(u64, u64)> {
    let offloads = records
        .iter()
        .filter(|r| r.metric == Metric::OffloadingType)
        .collect::<Vec<_>>();
    if offloads.is_empty() {
        return None;
    }

    let mut by_task: BTreeMap<i64, (f64, Branch)> = BTreeMap::new();
    let (mut local, mut remote) = (0, 0);
    for r in offloads {
        let branch = Branch::of(r);
        match r.task_id {
            Some(id) => {
                let candidate = (r.time, branch);
                let entry = by_task.entry(id).or_insert(candidate);
                if later(candidate, *entry) {
                    *entry = candidate;
                }
            }
            None if branch == Branch::Remote => remote += 1,
            None => local += 1,
        }
    }

    for (_, (_, branch)) in by_task {
        match branch {
            Branch::Remote => remote += 1,
            Branch::Local => local += 1,
        }
    }
    Some((local, remote))
}

fn later(a: (f64, Branch), b: (f64, Branch)) -> bool {
    match a.0.total_cmp(&b.0) {
        ::std::cmp::Ordering::Greater => true,
        ::std::cmp::Ordering::Less => false,
        ::std::cmp::Ordering::Equal => a.1 == Branch::Remote && b.1 == Branch::Local,
    }
}
