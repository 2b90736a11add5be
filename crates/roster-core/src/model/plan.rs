use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// The six billing plans a subscription can carry.
///
/// Each variant maps to one opaque literal from the data files. The literals
/// are not parsed for structure: `"Plan3"` has no separating space and is
/// still its own plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanCode {
    #[serde(rename = "Plan 1")]
    Plan1,
    #[serde(rename = "Plan 2")]
    Plan2,
    #[serde(rename = "Plan3")]
    Plan3,
    #[serde(rename = "Plan 6")]
    Plan6,
    #[serde(rename = "Plan 12")]
    Plan12,
    #[serde(rename = "Plan Unlimited")]
    Unlimited,
}

impl PlanCode {
    /// Every known plan in display order.
    pub const ALL: [Self; 6] = [
        Self::Plan1,
        Self::Plan2,
        Self::Plan3,
        Self::Plan6,
        Self::Plan12,
        Self::Unlimited,
    ];

    /// The literal used in data files and URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plan1 => "Plan 1",
            Self::Plan2 => "Plan 2",
            Self::Plan3 => "Plan3",
            Self::Plan6 => "Plan 6",
            Self::Plan12 => "Plan 12",
            Self::Unlimited => "Plan Unlimited",
        }
    }

    /// Monthly price in cents.
    #[must_use]
    pub const fn price(self) -> Cents {
        Cents(match self {
            Self::Plan1 => 999,
            Self::Plan2 => 1_799,
            Self::Plan3 => 2_499,
            Self::Plan6 => 4_499,
            Self::Plan12 => 7_999,
            Self::Unlimited => 14_999,
        })
    }
}

impl fmt::Display for PlanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanCode {
    type Err = ParseEnumError;

    /// Exact literal match; `"plan 1"` or `"Plan1"` are not plans.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|plan| plan.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                expected: "plan",
                got: s.to_string(),
            })
    }
}

/// The plan carried by a joined record.
///
/// Literals outside the known six are kept verbatim so nothing is lost in
/// the join, but they never match a plan filter and earn no revenue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Plan {
    Known(PlanCode),
    Unlisted(String),
}

impl Plan {
    /// Classify a raw plan literal.
    #[must_use]
    pub fn from_literal(raw: &str) -> Self {
        raw.parse::<PlanCode>()
            .map_or_else(|_| Self::Unlisted(raw.to_string()), Self::Known)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(code) => code.as_str(),
            Self::Unlisted(raw) => raw,
        }
    }

    #[must_use]
    pub const fn code(&self) -> Option<PlanCode> {
        match self {
            Self::Known(code) => Some(*code),
            Self::Unlisted(_) => None,
        }
    }

    /// Revenue from the fixed price table; unlisted plans earn nothing.
    #[must_use]
    pub const fn revenue(&self) -> Cents {
        match self {
            Self::Known(code) => code.price(),
            Self::Unlisted(_) => Cents::ZERO,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A money amount in whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub u64);

impl Cents {
    pub const ZERO: Self = Self(0);
}

impl std::iter::Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|c| c.0).fold(0, u64::saturating_add))
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}
