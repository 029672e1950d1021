use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    pub max_attempts: u32,
    #[serde(with = "millis")]
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPollConfig {
    pub max_attempts: u32,
    #[serde(with = "millis")]
    pub interval: Duration,
    pub max_consecutive_errors: u32,
    /// Wall-clock cutoff that stops polling regardless of attempts left
    #[serde(with = "millis")]
    pub deadline: Duration,
}

impl Default for DocumentPollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_millis(2000),
            max_consecutive_errors: 3,
            deadline: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadPageConfig {
    pub page_size: u32,
}

impl Default for ThreadPageConfig {
    fn default() -> Self {
        Self { page_size: 20 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnConfig {
    pub run: PollConfig,
    /// How long a completed run stays visible before tracking is cleared
    #[serde(with = "millis")]
    pub completed_display: Duration,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            run: PollConfig::default(),
            completed_display: Duration::from_millis(2000),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_config_reads_millis() {
        let config: PollConfig =
            serde_json::from_value(serde_json::json!({ "max_attempts": 5, "interval": 250 })).unwrap();
        assert_eq!(config.interval, Duration::from_millis(250));
        assert_eq!(config.max_attempts, 5);
    }
}
