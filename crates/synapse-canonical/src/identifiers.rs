use crate::validation::ValidationError;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a value without validation; callers are responsible for conformity.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Parses a validated identifier from a string.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
                let s = value.into();
                let re = RE.get_or_init(|| Regex::new($pattern).expect("invalid regex"));
                if !re.is_match(&s) {
                    return Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value: s,
                    });
                }
                Ok(Self(s))
            }

            /// Borrowed string form.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype!(
    CapabilityId,
    "Dotted capability identifier like `audit.view` or `system.configure`.",
    r"^[a-z][a-z0-9_-]*([.][a-z][a-z0-9_-]*){0,7}$"
);
newtype!(
    SpaceId,
    "Identifier of a workspace (space) a session can switch into.",
    r"^[A-Za-z0-9][A-Za-z0-9_.:-]{0,127}$"
);
newtype!(
    ActorId,
    "Stable identifier of the principal requesting a decision.",
    r"^[A-Za-z0-9][A-Za-z0-9_.:@-]{0,127}$"
);
newtype!(
    Timestamp,
    "UTC RFC3339 timestamp with `Z` suffix.",
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,9})?Z$"
);

impl Timestamp {
    /// Formats an instant with millisecond precision, e.g. `2026-01-02T03:04:05.678Z`.
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Parses the stored string back into an instant.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, ValidationError> {
        DateTime::parse_from_rfc3339(&self.0)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ValidationError::InvalidTimestamp {
                field: "Timestamp",
                value: self.0.clone(),
            })
    }
}
