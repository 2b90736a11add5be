//! Query state: everything the user currently wants to see.
//!
//! A [`QueryState`] is a value. Every interaction is a transition that
//! returns a new state; nothing mutates a state in place. Changing the search
//! text, a filter, or the sort resets the page to 1.

use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr};

use crate::model::{ParseEnumError, PlanCode, Status};

/// Plan filter: everything, or one exact plan.
///
/// Serializes as its URL literal (`"All"`, `"Plan 1"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlanFilter {
    #[default]
    All,
    Only(PlanCode),
}

impl PlanFilter {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(plan) => plan.as_str(),
        }
    }
}

impl Serialize for PlanFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for PlanFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            return Ok(Self::All);
        }
        s.parse::<PlanCode>().map(Self::Only)
    }
}

/// Status filter: everything, or one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(status) => status.as_str(),
        }
    }
}

impl Serialize for StatusFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            return Ok(Self::All);
        }
        s.parse::<Status>().map(Self::Only)
    }
}

/// Column a subscriber list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Name,
    Email,
    Plan,
    Status,
    ExpiresOn,
    JoinDate,
    Country,
    Revenue,
}

impl SortField {
    /// Every column in table order.
    pub const ALL: [Self; 8] = [
        Self::Name,
        Self::Email,
        Self::Plan,
        Self::Status,
        Self::ExpiresOn,
        Self::JoinDate,
        Self::Country,
        Self::Revenue,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Plan => "plan",
            Self::Status => "status",
            Self::ExpiresOn => "expiresOn",
            Self::JoinDate => "joinDate",
            Self::Country => "country",
            Self::Revenue => "revenue",
        }
    }

    /// Column header shown above the field.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "USER",
            Self::Email => "EMAIL",
            Self::Plan => "PLAN",
            Self::Status => "STATUS",
            Self::ExpiresOn => "EXPIRES ON",
            Self::JoinDate => "JOIN DATE",
            Self::Country => "COUNTRY",
            Self::Revenue => "REVENUE",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                expected: "sort field",
                got: s.to_string(),
            })
    }
}

/// Sort direction. `Unsorted` keeps the join order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
    #[serde(rename = "none")]
    Unsorted,
}

impl SortDirection {
    /// Next direction for a repeated click on the same column:
    /// `Asc → Desc → Unsorted → Asc`.
    #[must_use]
    pub const fn cycle(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Unsorted,
            Self::Unsorted => Self::Asc,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
            Self::Unsorted => "none",
        }
    }

    /// Arrow shown next to a column header.
    #[must_use]
    pub const fn indicator(self) -> &'static str {
        match self {
            Self::Asc => "↑",
            Self::Desc => "↓",
            Self::Unsorted => "↑↓",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            "none" => Ok(Self::Unsorted),
            other => Err(ParseEnumError {
                expected: "sort direction",
                got: other.to_string(),
            }),
        }
    }
}

/// Complete, serializable description of the current list view.
///
/// Fields are private so `page >= 1` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    search_text: String,
    plan: PlanFilter,
    status: StatusFilter,
    sort_field: SortField,
    sort_direction: SortDirection,
    page: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            plan: PlanFilter::All,
            status: StatusFilter::All,
            sort_field: SortField::Name,
            sort_direction: SortDirection::Asc,
            page: 1,
        }
    }
}

impl QueryState {
    /// Build a state from parts; a page below 1 becomes 1.
    #[must_use]
    pub fn new(
        search_text: impl Into<String>,
        plan: PlanFilter,
        status: StatusFilter,
        sort_field: SortField,
        sort_direction: SortDirection,
        page: u32,
    ) -> Self {
        Self {
            search_text: search_text.into(),
            plan,
            status,
            sort_field,
            sort_direction,
            page: page.max(1),
        }
    }

    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    #[must_use]
    pub const fn plan(&self) -> PlanFilter {
        self.plan
    }

    #[must_use]
    pub const fn status(&self) -> StatusFilter {
        self.status
    }

    #[must_use]
    pub const fn sort_field(&self) -> SortField {
        self.sort_field
    }

    #[must_use]
    pub const fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// New search text. Unchanged text leaves the state (and page) alone.
    #[must_use]
    pub fn with_search(&self, text: impl Into<String>) -> Self {
        let text = text.into();
        if text == self.search_text {
            return self.clone();
        }
        Self {
            search_text: text,
            page: 1,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_plan(&self, plan: PlanFilter) -> Self {
        if plan == self.plan {
            return self.clone();
        }
        Self {
            plan,
            page: 1,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_status(&self, status: StatusFilter) -> Self {
        if status == self.status {
            return self.clone();
        }
        Self {
            status,
            page: 1,
            ..self.clone()
        }
    }

    /// Column header click.
    ///
    /// Clicking the current column cycles its direction; clicking another
    /// column selects it ascending. Either way the page resets.
    #[must_use]
    pub fn toggle_sort(&self, field: SortField) -> Self {
        let sort_direction = if field == self.sort_field {
            self.sort_direction.cycle()
        } else {
            SortDirection::Asc
        };
        Self {
            sort_field: field,
            sort_direction,
            page: 1,
            ..self.clone()
        }
    }

    /// Set field and direction directly (used when decoding a URL).
    #[must_use]
    pub fn with_sort(&self, field: SortField, direction: SortDirection) -> Self {
        if field == self.sort_field && direction == self.sort_direction {
            return self.clone();
        }
        Self {
            sort_field: field,
            sort_direction: direction,
            page: 1,
            ..self.clone()
        }
    }

    /// Jump to a page; values below 1 become 1. Upper clamping needs the
    /// result size and happens in the paginator.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// True when every field holds its default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
