//! The canonical shape of one raw observation emitted by the simulator.

use std::fmt;
use std::str::FromStr;

/// Metric names recognised by the aggregators. Anything else is kept verbatim
/// in `Other` so that no row is lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    /// 1.0 if the task finished before its deadline, 0.0 otherwise.
    TaskSuccess,
    /// Creation-to-completion latency in seconds.
    TaskLatency,
    /// `deadline - completion time`; negative is a deadline violation.
    TaskMargin,
    /// Upload time of the task input to the RSU.
    TransferTime,
    /// Energy spent on one task, split by tag (`CpuOnly` / `TxOnly`).
    EnergyConsumption,
    /// Pre-summed CPU energy.
    TotalEnergyCpu,
    /// Pre-summed transmission energy.
    TotalEnergyTx,
    /// Where a task was executed; the tag says `Local` or `Remote`.
    OffloadingType,
    /// Length of the decision queue.
    QueueSizeDecision,
    /// Length of the CPU processing queue.
    QueueSizeProcessing,
    /// Remaining battery in joules.
    BatteryRemaining,
    /// A task was dropped because a queue was full.
    FullQueueError,
    /// Any metric we do not reduce.
    Other(String),
}

impl Metric {
    /// The name as it appears in the log.
    pub fn name(&self) -> &str {
        match *self {
            Metric::TaskSuccess => "TaskSuccess",
            Metric::TaskLatency => "TaskLatency",
            Metric::TaskMargin => "TaskMargin",
            Metric::TransferTime => "TransferTime",
            Metric::EnergyConsumption => "EnergyConsumption",
            Metric::TotalEnergyCpu => "TotalEnergyCPU",
            Metric::TotalEnergyTx => "TotalEnergyTx",
            Metric::OffloadingType => "OffloadingType",
            Metric::QueueSizeDecision => "QueueSize_Decision",
            Metric::QueueSizeProcessing => "QueueSize_Processing",
            Metric::BatteryRemaining => "BatteryRemaining",
            Metric::FullQueueError => "FullQueueError",
            Metric::Other(ref name) => name,
        }
    }

    /// Boolean-like metrics only admit 0.0 or 1.0.
    pub fn is_boolean(&self) -> bool {
        match *self {
            Metric::TaskSuccess | Metric::FullQueueError => true,
            _ => false,
        }
    }
}

impl FromStr for Metric {
    type Err = ();

    /// Never fails: unknown names become `Metric::Other`.
    fn from_str(s: &str) -> Result<Metric, ()> {
        let metric = match s.trim() {
            "TaskSuccess" => Metric::TaskSuccess,
            "TaskLatency" => Metric::TaskLatency,
            "TaskMargin" => Metric::TaskMargin,
            "TransferTime" => Metric::TransferTime,
            "EnergyConsumption" => Metric::EnergyConsumption,
            "TotalEnergyCPU" => Metric::TotalEnergyCpu,
            "TotalEnergyTx" => Metric::TotalEnergyTx,
            "OffloadingType" => Metric::OffloadingType,
            "QueueSize_Decision" => Metric::QueueSizeDecision,
            "QueueSize_Processing" => Metric::QueueSizeProcessing,
            "BatteryRemaining" => Metric::BatteryRemaining,
            "FullQueueError" => Metric::FullQueueError,
            other => Metric::Other(other.to_string()),
        };
        Ok(metric)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One observation: `time, entityId, metric, value, tag, taskId`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Simulation clock in seconds. Non-finite when the field was unreadable.
    pub time: f64,

    /// The observing vehicle (or RSU). -1 when unknown.
    pub entity_id: i64,

    /// What was observed.
    pub metric: Metric,

    /// The observed value, already normalised to the metric's domain.
    pub value: f64,

    /// Free-text classifier, e.g. `Remote | t3` for `OffloadingType`.
    pub tag: String,

    /// Task this observation belongs to, if any.
    pub task_id: Option<i64>,
}

/// Result of turning raw text fields into an `EventRecord`. The record is
/// always produced; `malformed` counts the fields that had to be defaulted.
#[derive(Debug)]
pub struct Parsed {
    /// The record.
    pub record: EventRecord,

    /// Number of defaulted fields (0 for a clean row).
    pub malformed: usize,
}

impl EventRecord {
    /// Creates a record, normalising `value` to the domain of `metric`.
    pub fn new(time: f64, entity_id: i64, metric: Metric, value: f64, tag: &str) -> Self {
        let value = normalize(&metric, value);
        EventRecord {
            time: time,
            entity_id: entity_id,
            metric: metric,
            value: value,
            tag: tag.to_string(),
            task_id: None,
        }
    }

    /// Attaches a task id. Negative ids mean "not task-scoped".
    pub fn with_task(mut self, task_id: i64) -> Self {
        self.task_id = if task_id < 0 { None } else { Some(task_id) };
        self
    }

    /// Builds a record from raw text fields. Missing trailing fields are
    /// `None`. Unparsable values become 0.0 and are reported, never dropped.
    pub fn from_fields(fields: &[Option<&str>]) -> Parsed {
        let field = |i: usize| fields.get(i).cloned().unwrap_or(None).map(str::trim);
        let mut malformed = 0;

        let time = match field(0).map(str::parse::<f64>) {
            Some(Ok(t)) => t,
            _ => {
                warn!("malformed time {:?}; record kept without a time bucket", field(0));
                malformed += 1;
                ::std::f64::NAN
            }
        };

        let entity_id = match field(1).map(str::parse::<i64>) {
            Some(Ok(id)) => id,
            _ => {
                debug!("malformed entity id {:?}", field(1));
                malformed += 1;
                -1
            }
        };

        let metric: Metric = field(2).unwrap_or("").parse().unwrap_or(Metric::Other(String::new()));

        let value = match field(3).map(str::parse::<f64>) {
            Some(Ok(v)) if !v.is_nan() => v,
            raw => {
                warn!(
                    "malformed value {:?} for {} at t={}; substituting 0.0",
                    raw.and(field(3)),
                    metric,
                    time
                );
                malformed += 1;
                0.0
            }
        };

        let tag = field(4).unwrap_or("");
        let task_id = match field(5) {
            None | Some("") => -1,
            Some(raw) => raw.parse::<i64>().unwrap_or_else(|_| {
                debug!("malformed task id {:?}", raw);
                -1
            }),
        };

        Parsed {
            record: EventRecord::new(time, entity_id, metric, value, tag).with_task(task_id),
            malformed: malformed,
        }
    }

    /// Whether the tag contains `needle`, ignoring case.
    pub fn tag_contains(&self, needle: &str) -> bool {
        self.tag.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Boolean metrics are thresholded at 0.5 so that rates stay within [0, 1].
fn normalize(metric: &Metric, value: f64) -> f64 {
    if !metric.is_boolean() {
        return value;
    }
    if value != 0.0 && value != 1.0 {
        warn!("{} outside {{0, 1}}: {}", metric, value);
    }
    if value >= 0.5 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(fields: &[&str]) -> Parsed {
        let fields = fields.iter().map(|f| Some(*f)).collect::<Vec<_>>();
        EventRecord::from_fields(&fields)
    }

    #[test]
    fn test_parse_full_row() {
        let p = parse(&["1.25", "3", "TaskLatency", "0.042", "", "17", "RSU"]);
        assert_eq!(p.malformed, 0);
        assert_eq!(p.record.time, 1.25);
        assert_eq!(p.record.entity_id, 3);
        assert_eq!(p.record.metric, Metric::TaskLatency);
        assert_eq!(p.record.value, 0.042);
        assert_eq!(p.record.task_id, Some(17));
    }

    #[test]
    fn test_malformed_value_is_zero_not_dropped() {
        let p = parse(&["2.0", "1", "EnergyConsumption", "abc", "CpuOnly"]);
        assert_eq!(p.malformed, 1);
        assert_eq!(p.record.value, 0.0);
        assert_eq!(p.record.metric, Metric::EnergyConsumption);
        assert_eq!(p.record.task_id, None);
    }

    #[test]
    fn test_missing_fields() {
        let p = EventRecord::from_fields(&[Some("0.5"), Some("1"), Some("BatteryRemaining")]);
        assert_eq!(p.malformed, 1);
        assert_eq!(p.record.value, 0.0);
        assert_eq!(p.record.tag, "");

        let p = parse(&["x", "1", "QueueSize_Decision", "4"]);
        assert!(p.record.time.is_nan());
        assert_eq!(p.record.value, 4.0);
    }

    #[test]
    fn test_boolean_domain() {
        assert_eq!(parse(&["0", "1", "TaskSuccess", "0.7"]).record.value, 1.0);
        assert_eq!(parse(&["0", "1", "TaskSuccess", "0.2"]).record.value, 0.0);
        assert_eq!(parse(&["0", "1", "TaskLatency", "0.7"]).record.value, 0.7);
    }

    #[test]
    fn test_unknown_metric_is_kept() {
        let p = parse(&["0", "1", "CpuEnergy", "3.0"]);
        assert_eq!(p.record.metric, Metric::Other("CpuEnergy".to_string()));
        assert_eq!(p.record.metric.to_string(), "CpuEnergy");
        assert_eq!(
            "QueueSize_Processing".parse::<Metric>(),
            Ok(Metric::QueueSizeProcessing)
        );
    }

    #[test]
    fn test_negative_task_id_is_absent() {
        let p = parse(&["0", "1", "OffloadingType", "1", "Remote", "-1"]);
        assert_eq!(p.record.task_id, None);
    }
}
