use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

use super::{Cents, ParseEnumError, Plan};

/// A billing-plan assignment as it appears in the subscriptions file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubscription {
    pub id: i64,
    /// Numeric user id stored as text; not guaranteed to parse.
    #[serde(alias = "userId", deserialize_with = "text_or_number")]
    pub user_id: String,
    #[serde(rename = "package", alias = "planCode")]
    pub plan_code: String,
    #[serde(alias = "expiresOn")]
    pub expires_on: String,
}

/// An identity row as it appears in the users file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
    pub id: i64,
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub active: ActiveFlag,
    #[serde(default)]
    pub country: String,
    /// Epoch seconds stored as text; not guaranteed to parse.
    #[serde(default, alias = "joinEpoch", deserialize_with = "text_or_number")]
    pub join_date: String,
}

/// The loosely typed `active` column: a bool, a number, or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActiveFlag {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Default for ActiveFlag {
    fn default() -> Self {
        Self::Bool(false)
    }
}

impl ActiveFlag {
    /// Whether the flag marks the user as active.
    ///
    /// Any non-empty text counts as active, including `"0"` and `"false"`;
    /// [`Self::reads_as_inactive`] flags those for data-quality reporting.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0.0 && !value.is_nan(),
            Self::Text(value) => !value.is_empty(),
        }
    }

    /// Text that a person would likely read as "inactive" even though it is
    /// truthy: `0`, `false`, `no`, `off`, `n` (case-insensitive, trimmed).
    #[must_use]
    pub fn reads_as_inactive(&self) -> bool {
        match self {
            Self::Text(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off" | "n"
            ),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }
}

/// Subscription status derived from the user's `active` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Active,
    Expired,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Expired => "Expired",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Expired" => Ok(Self::Expired),
            other => Err(ParseEnumError {
                expected: "status",
                got: other.to_string(),
            }),
        }
    }
}

/// The canonical joined, display-ready subscriber row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub plan: Plan,
    pub status: Status,
    /// `None` when the expiry text could not be parsed.
    pub expires_on: Option<DateTime<Utc>>,
    pub join_date: DateTime<Utc>,
    pub country: String,
    pub revenue: Cents,
}

/// Accept either a JSON string or a JSON number and keep it as text.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Number(number) => number.to_string(),
    })
}
