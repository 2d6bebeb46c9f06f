use std::time::Duration;

use nom::bytes::complete::take_until;
use nom::character::complete::{char, space0};
use nom::error::context;
use nom::sequence::{delimited, preceded, terminated, tuple};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::common::parser::{NomResult, consume_all, p_u32};
use crate::common::utils::time::{format_hms_duration, parse_hms_time};
use crate::pbs::client::PbsClient;
use crate::pbs::memory::{MemorySize, parse_memory_size};

/// Resource ceilings of a PBS queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueLimits {
    pub max_cores: u32,
    pub max_memory: MemorySize,
    #[serde(deserialize_with = "deserialize_hms", serialize_with = "serialize_hms")]
    pub max_walltime: Duration,
    pub max_jobs_per_user: u32,
}

impl Default for QueueLimits {
    fn default() -> Self {
        Self {
            max_cores: 4,
            max_memory: MemorySize::from_gb(16),
            max_walltime: Duration::from_secs(12 * 3600),
            max_jobs_per_user: 1,
        }
    }
}

fn deserialize_hms<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let value = String::deserialize(deserializer)?;
    parse_hms_time(&value).map_err(serde::de::Error::custom)
}

fn serialize_hms<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_hms_duration(duration))
}

fn p_max_run(input: &str) -> NomResult<'_, u32> {
    context(
        "[<kind>:<name>=<count>]",
        delimited(
            terminated(char('['), space0),
            preceded(tuple((take_until("="), char('='), space0)), p_u32),
            preceded(space0, char(']')),
        ),
    )(input)
}

/// Extracts the count from a PBS limit token such as `[u:PBS_GENERIC=1]`.
pub fn parse_max_run(value: &str) -> anyhow::Result<u32> {
    consume_all(p_max_run, value.trim())
}

fn json_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Builds queue limits from `qstat -Qf -F json` output.
///
/// Fails only when the output is not JSON or does not describe `queue` at all.
/// Individual fields that are missing or malformed fall back to `defaults`.
pub fn parse_queue_limits(
    queue: &str,
    data: &str,
    defaults: &QueueLimits,
) -> anyhow::Result<QueueLimits> {
    let data: Value = serde_json::from_str(data)?;
    let info = &data["Queue"][queue];
    if !info.is_object() {
        anyhow::bail!("qstat output does not contain queue {}", queue);
    }
    let max = &info["resources_max"];

    let max_cores = json_u32(&max["ncpus"]).unwrap_or_else(|| {
        log::warn!(
            "Queue {queue}: cannot read resources_max.ncpus, using default of {}",
            defaults.max_cores
        );
        defaults.max_cores
    });
    let max_memory = max["mem"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("missing resources_max.mem"))
        .and_then(parse_memory_size)
        .unwrap_or_else(|error| {
            log::warn!(
                "Queue {queue}: {error:#}, using default of {}",
                defaults.max_memory
            );
            defaults.max_memory
        });
    let max_walltime = max["walltime"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("missing resources_max.walltime"))
        .and_then(parse_hms_time)
        .unwrap_or_else(|error| {
            log::warn!("Queue {queue}: {error:#}, using default walltime");
            defaults.max_walltime
        });
    let max_jobs_per_user = info["max_run"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("missing max_run"))
        .and_then(parse_max_run)
        .unwrap_or_else(|error| {
            log::warn!(
                "Queue {queue}: {error:#}, assuming {} job(s) per user",
                defaults.max_jobs_per_user
            );
            defaults.max_jobs_per_user
        });

    Ok(QueueLimits {
        max_cores,
        max_memory,
        max_walltime,
        max_jobs_per_user,
    })
}

/// Queries the scheduler for the limits of `queue`.
/// Any failure falls back to `defaults`, the check has to stay usable without `qstat -F json`.
pub fn resolve_queue_limits(
    client: &dyn PbsClient,
    queue: &str,
    defaults: &QueueLimits,
) -> QueueLimits {
    let result = client
        .queue_info(queue)
        .and_then(|output| parse_queue_limits(queue, &output, defaults));
    match result {
        Ok(limits) => {
            log::debug!("Limits of queue {queue}: {limits:?}");
            limits
        }
        Err(error) => {
            log::warn!("Could not query limits of queue {queue}, using defaults: {error:#}");
            defaults.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{QueueLimits, parse_max_run, parse_queue_limits, resolve_queue_limits};
    use crate::pbs::memory::MemorySize;
    use crate::tests::utils::{MockPbs, QSTAT_QUEUE_JSON};

    #[test]
    fn max_run_token() {
        assert_eq!(parse_max_run("[u:PBS_GENERIC=1]").unwrap(), 1);
        assert_eq!(parse_max_run(" [o:PBS_ALL = 12] ").unwrap(), 12);
        assert!(parse_max_run("[u:PBS_GENERIC=]").is_err());
        assert!(parse_max_run("1").is_err());
        assert!(parse_max_run("[u:PBS_GENERIC=1").is_err());
    }

    #[test]
    fn limits_from_json() {
        let limits =
            parse_queue_limits("interactq", QSTAT_QUEUE_JSON, &QueueLimits::default()).unwrap();
        assert_eq!(
            limits,
            QueueLimits {
                max_cores: 8,
                max_memory: MemorySize::from_gb(32),
                max_walltime: Duration::from_secs(8 * 3600),
                max_jobs_per_user: 1,
            }
        );
    }

    #[test]
    fn ncpus_as_string() {
        let data = r#"{"Queue": {"q": {"resources_max": {"ncpus": "6"}}}}"#;
        let limits = parse_queue_limits("q", data, &QueueLimits::default()).unwrap();
        assert_eq!(limits.max_cores, 6);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let data = r#"{"Queue": {"q": {"resources_max": {"mem": "lots"}}}}"#;
        let defaults = QueueLimits::default();
        let limits = parse_queue_limits("q", data, &defaults).unwrap();
        assert_eq!(limits, defaults);
    }

    #[test]
    fn unknown_queue_is_an_error() {
        assert!(
            parse_queue_limits("other", QSTAT_QUEUE_JSON, &QueueLimits::default()).is_err()
        );
        assert!(parse_queue_limits("q", "", &QueueLimits::default()).is_err());
    }

    #[test]
    fn failed_query_falls_back() {
        let defaults = QueueLimits::default();
        let pbs = MockPbs::default();
        assert_eq!(resolve_queue_limits(&pbs, "interactq", &defaults), defaults);
    }

    #[test]
    fn live_query() {
        let pbs = MockPbs {
            queue_info: Some(QSTAT_QUEUE_JSON.to_string()),
            ..Default::default()
        };
        let limits = resolve_queue_limits(&pbs, "interactq", &QueueLimits::default());
        assert_eq!(limits.max_cores, 8);
    }
}
