use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Urgency tag attached to a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    #[serde(alias = "baja")]
    Low,
    /// Default urgency.
    #[default]
    #[serde(alias = "media")]
    Medium,
    /// Should be picked up soon.
    #[serde(alias = "alta")]
    High,
    /// Needs attention now.
    #[serde(alias = "urgente")]
    Urgent,
}

impl Priority {
    /// Every priority, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// String representation used on the wire and in filter names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Legacy (Spanish) name accepted for compatibility.
    #[must_use]
    pub const fn legacy_name(self) -> &'static str {
        match self {
            Self::Low => "baja",
            Self::Medium => "media",
            Self::High => "alta",
            Self::Urgent => "urgente",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for unrecognised priority tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid priority: {token}")]
pub struct InvalidPriority {
    /// Token as supplied by the caller.
    pub token: String,
}

impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized || p.legacy_name() == normalized)
            .ok_or_else(|| InvalidPriority { token: s.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_english_and_legacy_tokens() {
        assert_eq!("urgent".parse::<Priority>(), Ok(Priority::Urgent));
        assert_eq!(" Urgente ".parse::<Priority>(), Ok(Priority::Urgent));
        assert_eq!("baja".parse::<Priority>(), Ok(Priority::Low));
        assert!("later".parse::<Priority>().is_err());
    }

    #[test]
    fn serde_accepts_legacy_values() {
        let parsed: Priority =
            serde_json::from_str("\"alta\"").unwrap_or_else(|err| panic!("must parse: {err}"));
        assert_eq!(parsed, Priority::High);
        let written =
            serde_json::to_string(&Priority::High).unwrap_or_else(|err| panic!("must serialize: {err}"));
        assert_eq!(written, "\"high\"");
    }
}
