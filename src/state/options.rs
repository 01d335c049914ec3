//! User preferences

use serde::{Deserialize, Serialize};

/// Preferences persisted under the `opts` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Master switch for every sound.
    #[serde(default = "default_true")]
    pub sound: bool,
    /// Default warning lead, in minutes, offered for new timers.
    #[serde(default = "default_min_before")]
    pub min_before: u64,
    /// Background image shown behind the timers.
    #[serde(default = "default_true")]
    pub background: bool,
    /// Fetch a new background every day.
    #[serde(default = "default_true")]
    pub rotate_bg: bool,
}

fn default_true() -> bool {
    true
}

fn default_min_before() -> u64 {
    5
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sound: default_true(),
            min_before: default_min_before(),
            background: default_true(),
            rotate_bg: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let opts: Options = serde_json::from_str(r#"{"sound": false}"#).unwrap();
        assert!(!opts.sound);
        assert_eq!(opts.min_before, 5);
        assert!(opts.background);
        assert!(opts.rotate_bg);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(Options::default()).unwrap();
        assert_eq!(json["minBefore"], 5);
        assert_eq!(json["rotateBg"], true);
    }
}
