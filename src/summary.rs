//! Reading a previously written summary table back into `SummaryRecord`s.

use crate::errors::*;
use evaluation::SummaryRecord;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Looks columns up by header name.
struct Columns {
    header: Vec<String>,
    source: String,
}

impl Columns {
    fn index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Like `index`, but reports a schema mismatch when the column is absent.
    fn expect(&self, name: &str) -> Option<usize> {
        let i = self.index(name);
        if i.is_none() {
            let e: Error = ErrorKind::SchemaMismatch(self.source.clone(), name.to_string()).into();
            warn!("{}; {} reported unavailable", e, name);
        }
        i
    }
}

/// Reads the summary table at `path`.
pub fn read_summary<P: AsRef<Path>>(path: P) -> Result<Vec<SummaryRecord>> {
    let path = path.as_ref();
    let file =
        fs::File::open(path).chain_err(|| ErrorKind::MissingInput(path.display().to_string()))?;
    parse_summary(file, &path.display().to_string())
}

/// Parses a summary table. `Policy` is required. `Seed` falls back to
/// `Filename`, then to the row number. Every other missing column leaves its
/// field unset.
pub fn parse_summary<R: Read>(rdr: R, source: &str) -> Result<Vec<SummaryRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);
    let columns = Columns {
        header: reader.headers()?.iter().map(|h| h.to_string()).collect(),
        source: source.to_string(),
    };

    let policy = columns.index("Policy").ok_or_else(|| {
        Error::from_kind(ErrorKind::SchemaMismatch(
            source.to_string(),
            "Policy".to_string(),
        ))
    })?;
    let seed = columns.index("Seed").or_else(|| columns.index("Filename"));
    if seed.is_none() {
        debug!("{}: no Seed or Filename column; using row numbers", source);
    }

    let success = columns.expect("SuccessRate");
    let avg_latency = columns.expect("AvgLatency");
    let p50 = columns.index("P50Latency");
    let p95 = columns.index("P95Latency");
    let transfer = columns.index("AvgTransferTime");
    let failures = columns.expect("Failures");
    let overflows = columns.index("Overflows");
    let cpu = columns.expect("TotalEnergyCPU");
    let tx = columns.expect("TotalEnergyTx");
    let local = columns.expect("OffloadLocal");
    let remote = columns.expect("OffloadRemote");

    let mut summaries = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        let text = |c: Option<usize>| c.and_then(|c| row.get(c)).unwrap_or("");
        let float = |c: Option<usize>| parse_float(text(c), source, i);
        let count = |c: Option<usize>| float(c).map(|v| v.max(0.0).round() as u64);

        let seed = match seed {
            Some(_) if !text(seed).is_empty() => text(seed).to_string(),
            _ => i.to_string(),
        };
        let mut s = SummaryRecord::empty(text(Some(policy)), &seed);
        s.success_rate = float(success).unwrap_or(::std::f64::NAN);
        s.avg_latency = float(avg_latency);
        s.p50_latency = float(p50);
        s.p95_latency = float(p95);
        s.avg_transfer_time = float(transfer);
        s.failures = count(failures);
        s.overflows = count(overflows);
        s.total_energy_cpu = float(cpu);
        s.total_energy_tx = float(tx);
        s.offload_local = count(local);
        s.offload_remote = count(remote);
        summaries.push(s);
    }

    info!("read {} summaries from {}", summaries.len(), source);
    Ok(summaries)
}

/// An empty cell is unset. An unparsable one is 0.0.
fn parse_float(raw: &str, source: &str, row: usize) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            let field = format!("{} row {}", source, row + 1);
            let e: Error = ErrorKind::MalformedValue(field, raw.to_string()).into();
            warn!("{}; substituting 0.0", e);
            Some(0.0)
        }
    }
}
