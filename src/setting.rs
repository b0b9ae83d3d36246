//! Aggregation setting in TOML.

use crate::errors::*;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Maps a file-name pattern to a policy label.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PolicyPattern {
    /// Case-insensitive substring of the log file name.
    pub pattern: String,

    /// Label reported for matching runs.
    pub label: String,
}

impl PolicyPattern {
    fn new(pattern: &str, label: &str) -> Self {
        PolicyPattern {
            pattern: pattern.to_string(),
            label: label.to_string(),
        }
    }
}

/// File names of the emitted tables, relative to `output_dir`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Outputs {
    /// One row per run.
    pub summary: String,
    /// Cross-seed time series.
    pub timeseries: String,
    /// Mean / std per policy and metric.
    pub comparative: String,
    /// Seed points with their Pareto flag.
    pub pareto: String,
    /// Mean energy / success per policy.
    pub policy_points: String,
    /// Margin tail summaries.
    pub tails: String,
    /// Pooled margin CDF points.
    pub margin_cdf: String,
    /// Per-entity summaries.
    pub entity: String,
}

impl Default for Outputs {
    fn default() -> Self {
        Outputs {
            summary: "aggregated_summary.csv".to_string(),
            timeseries: "aggregated_timeseries.csv".to_string(),
            comparative: "comparative_stats.csv".to_string(),
            pareto: "pareto.csv".to_string(),
            policy_points: "policy_points.csv".to_string(),
            tails: "tail_latency.csv".to_string(),
            margin_cdf: "margin_cdf.csv".to_string(),
            entity: "entity_summary.csv".to_string(),
        }
    }
}

/// The aggregation setting.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Setting {
    /// Directory holding the simulator logs.
    pub results_dir: String,

    /// Directory the tables are written to.
    pub output_dir: String,

    /// Width of a time bucket in seconds.
    pub bucket_width: f64,

    /// Log files whose name contains one of these are skipped.
    pub exclude: Vec<String>,

    /// Policy patterns, tried in order.
    pub policy: Vec<PolicyPattern>,

    /// Also emit per-entity summaries.
    pub per_entity: bool,

    /// Table file names.
    pub output: Outputs,
}

impl Default for Setting {
    fn default() -> Self {
        Setting {
            results_dir: "results".to_string(),
            output_dir: "results".to_string(),
            bucket_width: 0.5,
            exclude: vec![
                "summary".to_string(),
                "metrics".to_string(),
                "aggregated".to_string(),
            ],
            policy: vec![
                PolicyPattern::new("first_remote", "FirstRemote"),
                PolicyPattern::new("intelligent", "Intelligent"),
                PolicyPattern::new("random", "Random"),
                PolicyPattern::new("local", "Local"),
                PolicyPattern::new("oracle", "Oracle"),
                PolicyPattern::new("deterministic", "Oracle"),
            ],
            per_entity: false,
            output: Outputs::default(),
        }
    }
}

impl Setting {
    /// Initialize from a file.
    pub fn init<P: AsRef<Path>>(path: P) -> Result<Setting> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .chain_err(|| ErrorKind::MissingInput(path.display().to_string()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let setting: Setting = toml::from_str(&contents)?;
        setting.validate()?;
        Ok(setting)
    }

    /// Reads `path` when it exists, otherwise starts from the defaults. The
    /// `RESULTS_DIR` and `OUTPUT_DIR` environment variables override the
    /// directories either way.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Setting> {
        let path = path.as_ref();
        let mut setting = if path.exists() {
            Setting::init(path)?
        } else {
            info!("{} not found; using default setting", path.display());
            Setting::default()
        };

        if let Ok(dir) = env::var("RESULTS_DIR") {
            setting.results_dir = dir;
        }
        if let Ok(dir) = env::var("OUTPUT_DIR") {
            setting.output_dir = dir;
        }
        setting.validate()?;
        Ok(setting)
    }

    /// Rejects values the aggregators cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.bucket_width.is_finite() || self.bucket_width <= 0.0 {
            bail!(ErrorKind::InvalidSetting(format!(
                "bucket_width must be positive, got {}",
                self.bucket_width
            )));
        }
        if self.policy.iter().any(|p| p.pattern.is_empty()) {
            bail!(ErrorKind::InvalidSetting("empty policy pattern".to_string()));
        }
        Ok(())
    }

    /// Whether a log file should be skipped.
    pub fn is_excluded(&self, filename: &str) -> bool {
        let name = filename.to_lowercase();
        self.exclude
            .iter()
            .any(|e| !e.is_empty() && name.contains(&e.to_lowercase()))
    }

    /// Policy label of a log file, from the first matching pattern.
    pub fn policy_of(&self, filename: &str) -> Option<&str> {
        let name = filename.to_lowercase();
        self.policy
            .iter()
            .find(|p| name.contains(&p.pattern.to_lowercase()))
            .map(|p| p.label.as_str())
    }

    /// Full path of an output table.
    pub fn output_path(&self, file: &str) -> PathBuf {
        Path::new(&self.output_dir).join(file)
    }
}

/// Seed of a log file: the last run of digits in its stem, or the whole stem
/// when it has none.
pub fn seed_of(stem: &str) -> String {
    stem.split(|c: char| !c.is_ascii_digit())
        .filter(|token| !token.is_empty())
        .last()
        .unwrap_or(stem)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_partial_toml() {
        let setting: Setting = toml::from_str("bucket_width = 1.0\nper_entity = true\n").unwrap();
        assert_eq!(setting.bucket_width, 1.0);
        assert!(setting.per_entity);
        assert_eq!(setting.results_dir, "results");
        assert_eq!(setting.output.summary, "aggregated_summary.csv");
        assert_eq!(setting.policy.len(), 6);
    }

    #[test]
    fn test_policy_table() {
        let text = r#"
            [[policy]]
            pattern = "greedy"
            label = "Greedy"

            [output]
            summary = "runs.csv"
        "#;
        let setting: Setting = toml::from_str(text).unwrap();
        assert_eq!(setting.policy_of("log_GREEDY_3.csv"), Some("Greedy"));
        assert_eq!(setting.policy_of("log_local_3.csv"), None);
        assert_eq!(setting.output.summary, "runs.csv");
        assert_eq!(setting.output.pareto, "pareto.csv");
    }

    #[test]
    fn test_default_policies() {
        let setting = Setting::default();
        assert_eq!(setting.policy_of("first_remote_seed1.csv"), Some("FirstRemote"));
        assert_eq!(setting.policy_of("Intelligent_42.csv"), Some("Intelligent"));
        assert_eq!(setting.policy_of("deterministic_7.csv"), Some("Oracle"));
        assert_eq!(setting.policy_of("foo.csv"), None);
        assert!(setting.is_excluded("aggregated_summary.csv"));
        assert!(setting.is_excluded("Metrics_local.csv"));
        assert!(!setting.is_excluded("local_1.csv"));
    }

    #[test]
    fn test_invalid_bucket_width() {
        let mut setting = Setting::default();
        setting.bucket_width = 0.0;
        assert!(setting.validate().is_err());
        setting.bucket_width = ::std::f64::NAN;
        assert!(setting.validate().is_err());
        setting.bucket_width = 0.25;
        assert!(setting.validate().is_ok());
    }

    #[test]
    fn test_seed_of() {
        assert_eq!(seed_of("intelligent_run_12"), "12");
        assert_eq!(seed_of("local-s3-r7"), "7");
        assert_eq!(seed_of("random"), "random");
        assert_eq!(seed_of("42"), "42");
    }
}
