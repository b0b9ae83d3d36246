//! Finalized, rendering-ready tables.
//!
//! A table is a header plus rows of text cells. Optional columns are dropped
//! when no row has a value for them. Missing values in the remaining columns
//! are empty cells; a NaN is written `NaN`.

use super::cdf::TailSummary;
use super::compare::{ComparativeStat, MarginCdf, PolicyPoint, SeedPoint};
use super::run::SummaryRecord;
use super::series::AggregatedSeries;

/// One cell before formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Verbatim text.
    Text(String),
    /// A measured quantity; `None` when not measured.
    Float(Option<f64>),
    /// A count; `None` when not measured.
    Count(Option<u64>),
}

impl Cell {
    fn is_set(&self) -> bool {
        match *self {
            Cell::Text(_) => true,
            Cell::Float(v) => v.is_some(),
            Cell::Count(v) => v.is_some(),
        }
    }

    fn render(&self) -> String {
        match *self {
            Cell::Text(ref s) => s.clone(),
            Cell::Float(Some(v)) => format!("{}", v),
            Cell::Count(Some(v)) => format!("{}", v),
            Cell::Float(None) | Cell::Count(None) => String::new(),
        }
    }
}

struct Column<R> {
    name: &'static str,
    optional: bool,
    cell: fn(&R) -> Cell,
}

fn col<R>(name: &'static str, cell: fn(&R) -> Cell) -> Column<R> {
    Column {
        name: name,
        optional: false,
        cell: cell,
    }
}

fn opt<R>(name: &'static str, cell: fn(&R) -> Cell) -> Column<R> {
    Column {
        name: name,
        optional: true,
        cell: cell,
    }
}

fn text<S: ToString>(s: S) -> Cell {
    Cell::Text(s.to_string())
}

/// A header and its rows, all cells already formatted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn build<R>(columns: &[Column<R>], records: &[R]) -> Table {
        let cells = records
            .iter()
            .map(|r| columns.iter().map(|c| (c.cell)(r)).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let keep = columns
            .iter()
            .enumerate()
            .map(|(i, c)| !c.optional || cells.iter().any(|row| row[i].is_set()))
            .collect::<Vec<bool>>();

        let header = columns
            .iter()
            .zip(&keep)
            .filter(|&(_, &k)| k)
            .map(|(c, _)| c.name.to_string())
            .collect();
        let rows = cells
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&keep)
                    .filter(|&(_, &k)| k)
                    .map(|(cell, _)| cell.render())
                    .collect()
            })
            .collect();

        Table {
            header: header,
            rows: rows,
        }
    }

    /// Column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Formatted rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no row.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column called `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// The cell at `row` in the column called `name`.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let i = self.column(name)?;
        self.rows.get(row).map(|r| r[i].as_str())
    }
}

fn summary_columns() -> Vec<Column<SummaryRecord>> {
    vec![
        col("Policy", |s: &SummaryRecord| text(&s.policy)),
        col("Seed", |s: &SummaryRecord| text(&s.seed)),
        col("SuccessRate", |s: &SummaryRecord| Cell::Float(Some(s.success_rate))),
        col("AvgLatency", |s: &SummaryRecord| Cell::Float(s.avg_latency)),
        opt("P50Latency", |s: &SummaryRecord| Cell::Float(s.p50_latency)),
        opt("P95Latency", |s: &SummaryRecord| Cell::Float(s.p95_latency)),
        opt("AvgTransferTime", |s: &SummaryRecord| Cell::Float(s.avg_transfer_time)),
        col("Failures", |s: &SummaryRecord| Cell::Count(s.failures)),
        opt("Overflows", |s: &SummaryRecord| Cell::Count(s.overflows)),
        col("TotalEnergyCPU", |s: &SummaryRecord| Cell::Float(s.total_energy_cpu)),
        col("TotalEnergyTx", |s: &SummaryRecord| Cell::Float(s.total_energy_tx)),
        col("OffloadLocal", |s: &SummaryRecord| Cell::Count(s.offload_local)),
        col("OffloadRemote", |s: &SummaryRecord| Cell::Count(s.offload_remote)),
    ]
}

/// One row per run.
pub fn summary_table(summaries: &[SummaryRecord]) -> Table {
    Table::build(&summary_columns(), summaries)
}

/// One row per (run, entity): the summary columns with `Entity` after `Seed`.
pub fn entity_table(summaries: &[(i64, SummaryRecord)]) -> Table {
    let (entities, records): (Vec<i64>, Vec<SummaryRecord>) = summaries.iter().cloned().unzip();
    let mut table = summary_table(&records);
    table.header.insert(2, "Entity".to_string());
    for (row, entity) in table.rows.iter_mut().zip(entities) {
        row.insert(2, entity.to_string());
    }
    table
}

/// One row per (policy, bucket).
pub fn series_table(series: &[AggregatedSeries]) -> Table {
    let columns: Vec<Column<AggregatedSeries>> = vec![
        col("Policy", |s: &AggregatedSeries| text(&s.policy)),
        col("Time", |s: &AggregatedSeries| Cell::Float(Some(s.time))),
        col("AvgQueueSize", |s: &AggregatedSeries| Cell::Float(s.avg_queue_size)),
        opt("AvgQueueProc", |s: &AggregatedSeries| Cell::Float(s.avg_queue_proc)),
        col("AvgBattery", |s: &AggregatedSeries| Cell::Float(s.avg_battery)),
        opt("AvgSuccess", |s: &AggregatedSeries| Cell::Float(s.avg_success)),
        col("Seeds", |s: &AggregatedSeries| Cell::Count(Some(s.seeds as u64))),
    ];
    Table::build(&columns, series)
}

/// One row per (policy, metric).
pub fn comparative_table(stats: &[ComparativeStat]) -> Table {
    let columns: Vec<Column<ComparativeStat>> = vec![
        col("Policy", |s: &ComparativeStat| text(&s.policy)),
        col("Metric", |s: &ComparativeStat| text(s.metric)),
        col("Mean", |s: &ComparativeStat| Cell::Float(s.mean)),
        col("Std", |s: &ComparativeStat| Cell::Float(s.std)),
        col("N", |s: &ComparativeStat| Cell::Count(Some(s.n as u64))),
    ];
    Table::build(&columns, stats)
}

/// One row per seed point.
pub fn pareto_table(points: &[SeedPoint]) -> Table {
    let columns: Vec<Column<SeedPoint>> = vec![
        col("Policy", |p: &SeedPoint| text(&p.policy)),
        col("Seed", |p: &SeedPoint| text(&p.seed)),
        col("Energy", |p: &SeedPoint| Cell::Float(Some(p.energy))),
        col("SuccessRate", |p: &SeedPoint| Cell::Float(Some(p.success))),
        col("Optimal", |p: &SeedPoint| text(p.optimal)),
    ];
    Table::build(&columns, points)
}

/// One row per policy mean point.
pub fn policy_point_table(points: &[PolicyPoint]) -> Table {
    let columns: Vec<Column<PolicyPoint>> = vec![
        col("Policy", |p: &PolicyPoint| text(&p.policy)),
        col("MeanEnergy", |p: &PolicyPoint| Cell::Float(Some(p.energy.mean))),
        col("StdEnergy", |p: &PolicyPoint| Cell::Float(Some(p.energy.std))),
        col("MeanSuccess", |p: &PolicyPoint| Cell::Float(Some(p.success.mean))),
        col("StdSuccess", |p: &PolicyPoint| Cell::Float(Some(p.success.std))),
        col("N", |p: &PolicyPoint| Cell::Count(Some(p.energy.n as u64))),
    ];
    Table::build(&columns, points)
}

/// One row per policy tail summary.
pub fn tail_table(tails: &[TailSummary]) -> Table {
    let columns: Vec<Column<TailSummary>> = vec![
        col("Policy", |t: &TailSummary| text(&t.policy)),
        col("Samples", |t: &TailSummary| Cell::Count(Some(t.samples as u64))),
        col("ViolationRate", |t: &TailSummary| Cell::Float(Some(t.violation_rate))),
        col("MinMargin", |t: &TailSummary| Cell::Float(Some(t.min))),
        col("P05Margin", |t: &TailSummary| Cell::Float(Some(t.p05))),
        col("P50Margin", |t: &TailSummary| Cell::Float(Some(t.p50))),
        col("P95Margin", |t: &TailSummary| Cell::Float(Some(t.p95))),
    ];
    Table::build(&columns, tails)
}

/// Every CDF point of every policy.
pub fn cdf_table(cdfs: &[MarginCdf]) -> Table {
    let points = cdfs
        .iter()
        .flat_map(|m| {
            m.cdf
                .points()
                .into_iter()
                .map(move |(margin, p)| (m.policy.clone(), margin, p))
        })
        .collect::<Vec<_>>();
    let columns: Vec<Column<(String, f64, f64)>> = vec![
        col("Policy", |p: &(String, f64, f64)| text(&p.0)),
        col("Margin", |p: &(String, f64, f64)| Cell::Float(Some(p.1))),
        col("Cdf", |p: &(String, f64, f64)| Cell::Float(Some(p.2))),
    ];
    Table::build(&columns, &points)
}
