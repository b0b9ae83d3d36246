//! Cross-seed comparison of policies.

use super::cdf::{EmpiricalCdf, TailSummary};
use super::pareto::Pool;
use super::run::{RunAggregate, SummaryRecord};
use super::stat::MeanStd;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Per-run quantities that are compared across policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompareMetric {
    /// Fraction of successful tasks.
    SuccessRate,
    /// Mean task latency.
    AvgLatency,
    /// Median task latency.
    P50Latency,
    /// 95th percentile task latency.
    P95Latency,
    /// Mean upload time.
    AvgTransferTime,
    /// Deadline violations.
    Failures,
    /// Queue overflows.
    Overflows,
    /// CPU energy.
    TotalEnergyCpu,
    /// Transmission energy.
    TotalEnergyTx,
    /// CPU plus transmission energy.
    TotalEnergy,
    /// Locally executed tasks.
    OffloadLocal,
    /// Offloaded tasks.
    OffloadRemote,
    /// Success rate per joule, computed for each seed.
    Efficiency,
}

impl CompareMetric {
    /// Every metric, in report order.
    pub fn all() -> Vec<CompareMetric> {
        vec![
            CompareMetric::SuccessRate,
            CompareMetric::AvgLatency,
            CompareMetric::P50Latency,
            CompareMetric::P95Latency,
            CompareMetric::AvgTransferTime,
            CompareMetric::Failures,
            CompareMetric::Overflows,
            CompareMetric::TotalEnergyCpu,
            CompareMetric::TotalEnergyTx,
            CompareMetric::TotalEnergy,
            CompareMetric::OffloadLocal,
            CompareMetric::OffloadRemote,
            CompareMetric::Efficiency,
        ]
    }

    /// Column name of the metric.
    pub fn name(&self) -> &'static str {
        match *self {
            CompareMetric::SuccessRate => "SuccessRate",
            CompareMetric::AvgLatency => "AvgLatency",
            CompareMetric::P50Latency => "P50Latency",
            CompareMetric::P95Latency => "P95Latency",
            CompareMetric::AvgTransferTime => "AvgTransferTime",
            CompareMetric::Failures => "Failures",
            CompareMetric::Overflows => "Overflows",
            CompareMetric::TotalEnergyCpu => "TotalEnergyCPU",
            CompareMetric::TotalEnergyTx => "TotalEnergyTx",
            CompareMetric::TotalEnergy => "TotalEnergy",
            CompareMetric::OffloadLocal => "OffloadLocal",
            CompareMetric::OffloadRemote => "OffloadRemote",
            CompareMetric::Efficiency => "Efficiency",
        }
    }

    /// The value of this metric for one run, if it was measured.
    pub fn of(&self, s: &SummaryRecord) -> Option<f64> {
        let value = match *self {
            CompareMetric::SuccessRate => Some(s.success_rate),
            CompareMetric::AvgLatency => s.avg_latency,
            CompareMetric::P50Latency => s.p50_latency,
            CompareMetric::P95Latency => s.p95_latency,
            CompareMetric::AvgTransferTime => s.avg_transfer_time,
            CompareMetric::Failures => s.failures.map(|v| v as f64),
            CompareMetric::Overflows => s.overflows.map(|v| v as f64),
            CompareMetric::TotalEnergyCpu => s.total_energy_cpu,
            CompareMetric::TotalEnergyTx => s.total_energy_tx,
            CompareMetric::TotalEnergy => s.total_energy(),
            CompareMetric::OffloadLocal => s.offload_local.map(|v| v as f64),
            CompareMetric::OffloadRemote => s.offload_remote.map(|v| v as f64),
            CompareMetric::Efficiency => s.efficiency(),
        };
        value.filter(|v| v.is_finite())
    }
}

impl fmt::Display for CompareMetric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Mean and std of one metric over one policy's seeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparativeStat {
    /// Policy label.
    pub policy: String,
    /// Compared metric.
    pub metric: CompareMetric,
    /// Mean over contributing seeds; `None` when `n == 0`.
    pub mean: Option<f64>,
    /// Sample std over contributing seeds; `None` when `n == 0`.
    pub std: Option<f64>,
    /// Seeds with a value for the metric.
    pub n: usize,
}

/// Result of a comparison.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    /// One row per (policy, metric), sorted by policy then metric.
    pub stats: Vec<ComparativeStat>,
    /// Metrics without any value in the input; they have no rows.
    pub unavailable: Vec<CompareMetric>,
}

impl Comparison {
    /// The row for `(policy, metric)`.
    pub fn get(&self, policy: &str, metric: CompareMetric) -> Option<&ComparativeStat> {
        self.stats
            .iter()
            .find(|s| s.policy == policy && s.metric == metric)
    }
}

/// Mean energy / success point of one policy with its spread.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyPoint {
    /// Policy label.
    pub policy: String,
    /// Total energy over the policy's seeds.
    pub energy: MeanStd,
    /// Success rate over the same seeds.
    pub success: MeanStd,
}

/// Energy / success of one seed, annotated with Pareto optimality over the
/// pool of every seed of every policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPoint {
    /// Policy label.
    pub policy: String,
    /// Seed identifier.
    pub seed: String,
    /// Total energy.
    pub energy: f64,
    /// Success rate.
    pub success: f64,
    /// Whether no other point dominates this one.
    pub optimal: bool,
}

/// Pooled deadline margins of one policy.
#[derive(Debug, Clone)]
pub struct MarginCdf {
    /// Policy label.
    pub policy: String,
    /// Distribution of the margins of every seed.
    pub cdf: EmpiricalCdf,
}

/// Derives comparative statistics from per-run summaries.
#[derive(Debug, Clone)]
pub struct ComparativeAnalyzer {
    metrics: Vec<CompareMetric>,
}

impl Default for ComparativeAnalyzer {
    fn default() -> Self {
        ComparativeAnalyzer::new(CompareMetric::all())
    }
}

impl ComparativeAnalyzer {
    /// Analyzer restricted to `metrics`.
    pub fn new(mut metrics: Vec<CompareMetric>) -> Self {
        metrics.sort();
        metrics.dedup();
        ComparativeAnalyzer { metrics: metrics }
    }

    /// Mean / std of every metric for every policy. Seeds whose value is
    /// missing or NaN do not contribute.
    pub fn compare(&self, summaries: &[SummaryRecord]) -> Comparison {
        let groups = by_policy(summaries);
        let mut comparison = Comparison::default();

        for &metric in &self.metrics {
            if !summaries.iter().any(|s| metric.of(s).is_some()) {
                warn!("{} has no value in any run; reported unavailable", metric);
                comparison.unavailable.push(metric);
            }
        }

        for (policy, runs) in &groups {
            for &metric in &self.metrics {
                if comparison.unavailable.contains(&metric) {
                    continue;
                }
                let stat = MeanStd::of(runs.iter().filter_map(|s| metric.of(s)));
                if stat.is_none() {
                    debug!("{}: no seed contributes to {}", policy, metric);
                }
                comparison.stats.push(ComparativeStat {
                    policy: policy.to_string(),
                    metric: metric,
                    mean: stat.map(|s| s.mean),
                    std: stat.map(|s| s.std),
                    n: stat.map_or(0, |s| s.n),
                });
            }
        }
        comparison
    }

    /// Mean energy / success per policy over the seeds that measured both.
    pub fn policy_points(&self, summaries: &[SummaryRecord]) -> Vec<PolicyPoint> {
        by_policy(summaries)
            .into_iter()
            .filter_map(|(policy, runs)| {
                let points = runs.iter().filter_map(|s| point_of(s)).collect::<Vec<_>>();
                let energy = MeanStd::of(points.iter().map(|p| p.0));
                let success = MeanStd::of(points.iter().map(|p| p.1));
                match (energy, success) {
                    (Some(energy), Some(success)) => Some(PolicyPoint {
                        policy: policy.to_string(),
                        energy: energy,
                        success: success,
                    }),
                    _ => {
                        warn!("{}: no seed has both energy and success", policy);
                        None
                    }
                }
            })
            .collect()
    }

    /// Every seed point with its Pareto flag, sorted by (policy, seed). Seeds
    /// missing energy or success are left out.
    pub fn seed_points(&self, summaries: &[SummaryRecord]) -> Vec<SeedPoint> {
        let mut pool = Pool::default();
        for s in summaries {
            if let Some((energy, success)) = point_of(s) {
                pool.add((s.policy.clone(), s.seed.clone()), energy, success);
            }
        }

        let mut points = pool
            .points()
            .iter()
            .map(|p| SeedPoint {
                policy: p.param.0.clone(),
                seed: p.param.1.clone(),
                energy: p.energy,
                success: p.success,
                optimal: !pool.is_dominated(p),
            })
            .collect::<Vec<_>>();
        points.sort_by(|a, b| a.policy.cmp(&b.policy).then_with(|| a.seed.cmp(&b.seed)));
        points
    }

    /// Margins of every seed pooled per policy, sorted by policy. Policies
    /// without margins are left out.
    pub fn margin_cdfs(&self, runs: &[RunAggregate]) -> Vec<MarginCdf> {
        let mut pooled: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for run in runs {
            pooled
                .entry(run.summary.policy.as_str())
                .or_insert_with(Vec::new)
                .extend(run.margins.iter().cloned());
        }
        pooled
            .into_iter()
            .map(|(policy, margins)| MarginCdf {
                policy: policy.to_string(),
                cdf: EmpiricalCdf::new(margins),
            })
            .filter(|m| !m.cdf.is_empty())
            .collect()
    }

    /// Tail summary of each pooled distribution.
    pub fn tails(&self, cdfs: &[MarginCdf]) -> Vec<TailSummary> {
        cdfs.iter()
            .filter_map(|m| TailSummary::of(&m.policy, &m.cdf))
            .collect()
    }
}

/// Summaries grouped by policy, policies and seeds in ascending order.
fn by_policy(summaries: &[SummaryRecord]) -> BTreeMap<&str, Vec<&SummaryRecord>> {
    let mut groups: BTreeMap<&str, Vec<&SummaryRecord>> = BTreeMap::new();
    for s in summaries {
        groups.entry(s.policy.as_str()).or_insert_with(Vec::new).push(s);
    }
    for runs in groups.values_mut() {
        runs.sort_by(|a, b| a.seed.cmp(&b.seed));
        let seeds = runs.iter().map(|s| s.seed.as_str()).collect::<BTreeSet<_>>();
        if seeds.len() != runs.len() {
            warn!(
                "{}: {} runs share {} seed ids",
                runs[0].policy,
                runs.len(),
                seeds.len()
            );
        }
    }
    groups
}

/// `(energy, success)` of a run when both are measured.
fn point_of(s: &SummaryRecord) -> Option<(f64, f64)> {
    let energy = s.total_energy().filter(|e| e.is_finite())?;
    if s.success_rate.is_finite() {
        Some((energy, s.success_rate))
    } else {
        None
    }
}
