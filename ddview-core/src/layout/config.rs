use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning parameters of a [`LayoutState`](super::LayoutState).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// How long a removed tab may stay absent before its close listeners
    /// fire. Covers tabs that are removed and immediately reinserted, as
    /// when dragging a tab to another panel.
    #[serde(with = "millis", rename = "close_event_delay_ms")]
    pub close_event_delay: Duration,

    /// Id of the empty tabs panel the layout starts with, and resets to when
    /// its root is removed.
    pub root_panel_id: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            close_event_delay: Duration::from_millis(10),
            root_panel_id: "default".to_string(),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: LayoutConfig = serde_json::from_str(r#"{"close_event_delay_ms": 25}"#).unwrap();
        assert_eq!(config.close_event_delay, Duration::from_millis(25));
        assert_eq!(config.root_panel_id, "default");
    }

    #[test]
    fn delay_is_written_in_millis() {
        let json = serde_json::to_value(LayoutConfig::default()).unwrap();
        assert_eq!(json["close_event_delay_ms"], 10);
    }
}
