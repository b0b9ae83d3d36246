//! Discovery and loading of simulator logs.

use crate::errors::*;
use crate::setting::{seed_of, Setting};
use evaluation::{EventRecord, Run};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Fields of a log row used to build a record: time, entity, metric, value,
/// tag, task id. A trailing location column is ignored.
const FIELDS: usize = 6;

/// A log file together with the run it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSource {
    /// Path to the log.
    pub path: PathBuf,

    /// Policy label.
    pub policy: String,

    /// Seed identifier.
    pub seed: String,
}

impl RunSource {
    /// Reads the whole log into a `Run`.
    pub fn load(&self) -> Result<Run> {
        let file = fs::File::open(&self.path)
            .chain_err(|| ErrorKind::MissingInput(self.path.display().to_string()))?;
        let run = load_run(file, &self.policy, &self.seed)?;
        if run.malformed > 0 {
            warn!(
                "{}: {} malformed fields defaulted",
                self.path.display(),
                run.malformed
            );
        }
        info!(
            "loaded {} records of {}/{} from {}",
            run.records.len(),
            run.policy,
            run.seed,
            self.path.display()
        );
        Ok(run)
    }
}

/// Takes a reader (file, string, etc.) and returns the run it holds. An
/// optional header row is skipped; short rows are padded with empty fields.
/// Fields that are not valid UTF-8 are decoded lossily so the row is kept.
pub fn load_run<R: Read>(rdr: R, policy: &str, seed: &str) -> Result<Run> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let mut records = Vec::new();
    let mut malformed = 0;
    for (line, row) in reader.byte_records().enumerate() {
        let row = row?;
        if line == 0 && is_header(&row) {
            trace!("skipping header {:?}", row);
            continue;
        }

        let fields = (0..FIELDS)
            .map(|i| row.get(i).map(String::from_utf8_lossy))
            .collect::<Vec<_>>();
        let lossy = fields
            .iter()
            .filter(|f| matches!(f, Some(Cow::Owned(_))))
            .count();
        if lossy > 0 {
            warn!(
                "{}/{}: row {} has {} fields that are not UTF-8",
                policy,
                seed,
                line + 1,
                lossy
            );
        }

        let fields = fields
            .iter()
            .map(|f| f.as_deref())
            .collect::<Vec<Option<&str>>>();
        let parsed = EventRecord::from_fields(&fields);
        malformed += parsed.malformed + lossy;
        records.push(parsed.record);
    }

    let mut run = Run::new(policy, seed, records);
    run.malformed = malformed;
    Ok(run)
}

fn is_header(row: &csv::ByteRecord) -> bool {
    row.get(0)
        .map_or(false, |f| f.eq_ignore_ascii_case(b"time"))
}

/// Lists the logs under `setting.results_dir`, sorted by path. Excluded names
/// and files without a known policy are skipped.
pub fn discover(setting: &Setting) -> Result<Vec<RunSource>> {
    let dir = Path::new(&setting.results_dir);
    let entries = fs::read_dir(dir)
        .chain_err(|| ErrorKind::MissingInput(dir.display().to_string()))?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension().map_or(true, |e| e != "csv") {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if setting.is_excluded(&name) {
            debug!("excluded {}", name);
            continue;
        }
        let policy = match setting.policy_of(&name) {
            Some(policy) => policy.to_string(),
            None => {
                warn!("no policy matches {}; skipped", name);
                continue;
            }
        };
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&name)
            .to_string();

        sources.push(RunSource {
            seed: seed_of(&stem),
            policy: policy,
            path: path,
        });
    }

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    disambiguate(&mut sources);
    info!("found {} logs in {}", sources.len(), dir.display());
    Ok(sources)
}

/// Logs that resolve to the same (policy, seed), e.g. `oracle_7.csv` and
/// `deterministic_7.csv`, are told apart by their file stems.
fn disambiguate(sources: &mut [RunSource]) {
    let mut seen: HashMap<(String, String), usize> = HashMap::new();
    for s in sources.iter() {
        *seen.entry((s.policy.clone(), s.seed.clone())).or_insert(0) += 1;
    }
    for s in sources.iter_mut() {
        if seen[&(s.policy.clone(), s.seed.clone())] < 2 {
            continue;
        }
        if let Some(stem) = s.path.file_stem().and_then(|n| n.to_str()) {
            warn!(
                "{}: seed {} of {} is taken by another log; using {}",
                s.path.display(),
                s.seed,
                s.policy,
                stem
            );
            s.seed = stem.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evaluation::Metric;

    const LOG: &str = "\
Time,EntityID,Metric,Value,Tag,TaskID,Location
0.10,1,TaskSuccess,1,,3,Vehicle
0.12,1,EnergyConsumption,0.5,CpuOnly,3,Vehicle
0.20,2,OffloadingType,1,Remote | t,4,RSU
0.30,2,BatteryRemaining,97.5
0.40,2,TaskLatency,oops,,4
";

    #[test]
    fn test_load_run_from_reader() {
        let run = load_run(LOG.as_bytes(), "Local", "1").unwrap();
        assert_eq!(run.records.len(), 5);
        assert_eq!(run.malformed, 1);

        assert_eq!(run.records[0].metric, Metric::TaskSuccess);
        assert_eq!(run.records[0].task_id, Some(3));
        assert_eq!(run.records[2].tag, "Remote | t");
        assert_eq!(run.records[3].task_id, None);
        assert_eq!(run.records[4].value, 0.0);
    }

    #[test]
    fn test_row_with_invalid_utf8_is_kept() {
        let mut log = b"0.10,1,TaskSuccess,1,,1,Vehicle\n".to_vec();
        log.extend_from_slice(b"0.20,1,TaskSuccess,0,\xff\xfe,2,Vehicle\n");
        log.extend_from_slice(b"0.30,1,TaskSuccess,1,,3,Vehicle\n");

        let run = load_run(&log[..], "Local", "1").unwrap();
        assert_eq!(run.records.len(), 3);
        assert_eq!(run.malformed, 1);
        assert_eq!(run.records[1].metric, Metric::TaskSuccess);
        assert_eq!(run.records[1].value, 0.0);
        assert_eq!(run.records[1].task_id, Some(2));
        assert_eq!(run.records[1].tag, "\u{fffd}\u{fffd}");
    }

    #[test]
    fn test_colliding_seeds_use_file_stems() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["oracle_7.csv", "deterministic_7.csv", "oracle_8.csv"] {
            fs::write(dir.path().join(name), "0.1,1,TaskSuccess,1\n").unwrap();
        }
        let mut setting = Setting::default();
        setting.results_dir = dir.path().display().to_string();

        let sources = discover(&setting).unwrap();
        let keys = sources
            .iter()
            .map(|s| (s.policy.as_str(), s.seed.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                ("Oracle", "deterministic_7"),
                ("Oracle", "oracle_7"),
                ("Oracle", "8"),
            ]
        );
    }

    #[test]
    fn test_headerless_log() {
        let run = load_run("1.0,3,QueueSize_Decision,4\n".as_bytes(), "Random", "2").unwrap();
        assert_eq!(run.records.len(), 1);
        assert_eq!(run.records[0].entity_id, 3);
        assert_eq!(run.records[0].value, 4.0);
    }
}
