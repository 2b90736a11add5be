//! Record joiner: subscriptions × users → canonical subscriber records.
//!
//! The join never fails. Gaps in the data (no matching user, unparseable ids,
//! epochs or dates) are substituted with sentinel values and reported as
//! [`JoinIssue`]s, each of which is also emitted as a `warn!` event so bad
//! data stays visible without changing the output.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::model::{ActiveFlag, Plan, RawSubscription, RawUser, Status, SubscriberRecord};

/// Email used when a subscription has no matching user (or the user has none).
pub const UNKNOWN_EMAIL: &str = "unknown@example.com";
/// Country used when a subscription has no matching user (or the user has none).
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// A data-quality problem found while joining one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinIssue {
    pub subscription_id: i64,
    pub kind: JoinIssueKind,
    /// The offending raw value.
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinIssueKind {
    /// `user_id` is not an integer, so no user can match.
    InvalidUserId,
    /// `user_id` parsed but no user carries that id.
    UnmatchedUser,
    /// The user's join epoch is not numeric; join date fell back to now.
    InvalidJoinEpoch,
    /// `expires_on` is not a recognized date.
    InvalidExpiry,
    /// The `active` text is non-empty, so the user counts as active, but it
    /// reads like a negative (`"0"`, `"false"`, ...).
    SuspiciousActiveFlag,
}

impl JoinIssueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUserId => "invalid_user_id",
            Self::UnmatchedUser => "unmatched_user",
            Self::InvalidJoinEpoch => "invalid_join_epoch",
            Self::InvalidExpiry => "invalid_expiry",
            Self::SuspiciousActiveFlag => "suspicious_active_flag",
        }
    }
}

impl fmt::Display for JoinIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records produced by a join plus every fallback that was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinOutcome {
    pub records: Vec<SubscriberRecord>,
    pub issues: Vec<JoinIssue>,
}

/// Join using the wall clock for missing join dates.
#[must_use]
pub fn join(subscriptions: &[RawSubscription], users: &[RawUser]) -> Vec<SubscriberRecord> {
    join_at(subscriptions, users, Utc::now()).records
}

/// Join with an explicit "now" used wherever a join date cannot be derived.
///
/// Output order matches `subscriptions`. When several users share an id the
/// first one wins.
#[must_use]
pub fn join_at(
    subscriptions: &[RawSubscription],
    users: &[RawUser],
    now: DateTime<Utc>,
) -> JoinOutcome {
    let mut by_id: HashMap<i64, &RawUser> = HashMap::with_capacity(users.len());
    for user in users {
        by_id.entry(user.id).or_insert(user);
    }

    let mut outcome = JoinOutcome {
        records: Vec::with_capacity(subscriptions.len()),
        issues: Vec::new(),
    };

    for sub in subscriptions {
        let user = match sub.user_id.trim().parse::<i64>() {
            Ok(user_id) => {
                let found = by_id.get(&user_id).copied();
                if found.is_none() {
                    report(&mut outcome.issues, sub, JoinIssueKind::UnmatchedUser, &sub.user_id);
                }
                found
            }
            Err(_) => {
                report(&mut outcome.issues, sub, JoinIssueKind::InvalidUserId, &sub.user_id);
                None
            }
        };

        let expires_on = parse_date(&sub.expires_on);
        if expires_on.is_none() {
            report(&mut outcome.issues, sub, JoinIssueKind::InvalidExpiry, &sub.expires_on);
        }

        if let Some(ActiveFlag::Text(raw)) =
            user.map(|u| &u.active).filter(|flag| flag.reads_as_inactive())
        {
            report(&mut outcome.issues, sub, JoinIssueKind::SuspiciousActiveFlag, raw);
        }

        let join_date = match user {
            Some(user) => parse_epoch_seconds(&user.join_date).unwrap_or_else(|| {
                report(&mut outcome.issues, sub, JoinIssueKind::InvalidJoinEpoch, &user.join_date);
                now
            }),
            None => now,
        };

        let plan = Plan::from_literal(&sub.plan_code);
        let revenue = plan.revenue();

        let record = match user {
            Some(user) => SubscriberRecord {
                id: sub.id.to_string(),
                name: format!("{} {}", user.first_name, user.last_name),
                email: non_empty_or(&user.email, UNKNOWN_EMAIL),
                plan,
                status: if user.active.is_truthy() {
                    Status::Active
                } else {
                    Status::Expired
                },
                expires_on,
                join_date,
                country: non_empty_or(&user.country, UNKNOWN_COUNTRY),
                revenue,
            },
            None => SubscriberRecord {
                id: sub.id.to_string(),
                name: format!("User {}", sub.user_id),
                email: UNKNOWN_EMAIL.to_string(),
                plan,
                status: Status::Expired,
                expires_on,
                join_date,
                country: UNKNOWN_COUNTRY.to_string(),
                revenue,
            },
        };
        outcome.records.push(record);
    }

    outcome
}

fn report(issues: &mut Vec<JoinIssue>, sub: &RawSubscription, kind: JoinIssueKind, raw: &str) {
    warn!(
        target: "roster::join",
        subscription_id = sub.id,
        user_id = %sub.user_id,
        raw = %raw,
        reason = %kind,
        "join fallback applied"
    );
    issues.push(JoinIssue {
        subscription_id: sub.id,
        kind,
        raw: raw.to_string(),
    });
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Parse epoch seconds (integer or fractional). Empty or non-numeric text,
/// non-finite values and out-of-range instants yield `None`.
#[must_use]
pub fn parse_epoch_seconds(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    let secs = raw.parse::<f64>().ok().filter(|s| s.is_finite())?;
    #[allow(clippy::cast_possible_truncation)]
    let millis = (secs * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis)
}

/// Parse an expiry date: RFC 3339, `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`
/// (the last two read as UTC).
#[must_use]
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cents, PlanCode};

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).expect("valid timestamp")
    }

    fn sub(id: i64, user_id: &str, plan: &str) -> RawSubscription {
        RawSubscription {
            id,
            user_id: user_id.to_string(),
            plan_code: plan.to_string(),
            expires_on: "2025-06-30".to_string(),
        }
    }

    fn user(id: i64, first: &str, active: ActiveFlag, join_date: &str) -> RawUser {
        RawUser {
            id,
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            email: format!("{}@example.org", first.to_lowercase()),
            active,
            country: "NZ".to_string(),
            join_date: join_date.to_string(),
        }
    }

    #[test]
    fn matched_subscription_takes_user_fields() {
        let outcome = join_at(
            &[sub(1, "10", "Plan 2")],
            &[user(10, "Ann", ActiveFlag::Text("1".into()), "1700000000")],
            now(),
        );
        assert!(outcome.issues.is_empty());
        let record = &outcome.records[0];
        assert_eq!(record.id, "1");
        assert_eq!(record.name, "Ann Doe");
        assert_eq!(record.email, "ann@example.org");
        assert_eq!(record.status, Status::Active);
        assert_eq!(record.plan, Plan::Known(PlanCode::Plan2));
        assert_eq!(record.revenue, Cents(1_799));
        assert_eq!(record.country, "NZ");
        assert_eq!(record.join_date.timestamp(), 1_700_000_000);
        assert_eq!(
            record.expires_on.map(|d| d.date_naive().to_string()),
            Some("2025-06-30".to_string())
        );
    }

    #[test]
    fn inactive_user_is_expired() {
        let outcome = join_at(
            &[sub(1, "10", "Plan 1")],
            &[user(10, "Ann", ActiveFlag::Bool(false), "1700000000")],
            now(),
        );
        assert_eq!(outcome.records[0].status, Status::Expired);
    }

    #[test]
    fn negative_looking_active_text_is_still_active_and_reported() {
        for text in ["0", "false", "no"] {
            let outcome = join_at(
                &[sub(1, "10", "Plan 1")],
                &[user(10, "Ann", ActiveFlag::Text(text.into()), "1700000000")],
                now(),
            );
            assert_eq!(outcome.records[0].status, Status::Active, "active = {text:?}");
            assert_eq!(outcome.issues[0].kind, JoinIssueKind::SuspiciousActiveFlag);
            assert_eq!(outcome.issues[0].raw, text);
        }

        let outcome = join_at(
            &[sub(1, "10", "Plan 1")],
            &[user(10, "Ann", ActiveFlag::Text(String::new()), "1700000000")],
            now(),
        );
        assert_eq!(outcome.records[0].status, Status::Expired);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn unmatched_subscription_gets_sentinels() {
        let outcome = join_at(&[sub(4, "99", "Plan 6")], &[], now());
        let record = &outcome.records[0];
        assert_eq!(record.name, "User 99");
        assert_eq!(record.email, UNKNOWN_EMAIL);
        assert_eq!(record.country, UNKNOWN_COUNTRY);
        assert_eq!(record.status, Status::Expired);
        assert_eq!(record.join_date, now());
        assert_eq!(
            outcome.issues,
            vec![JoinIssue {
                subscription_id: 4,
                kind: JoinIssueKind::UnmatchedUser,
                raw: "99".to_string(),
            }]
        );
    }

    #[test]
    fn non_numeric_user_id_is_reported_not_fatal() {
        let outcome = join_at(
            &[sub(2, "abc", "Plan 1")],
            &[user(10, "Ann", ActiveFlag::Bool(true), "1")],
            now(),
        );
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].name, "User abc");
        assert_eq!(outcome.issues[0].kind, JoinIssueKind::InvalidUserId);
    }

    #[test]
    fn bad_join_epoch_falls_back_to_now_and_is_reported() {
        let outcome = join_at(
            &[sub(1, "10", "Plan 1")],
            &[user(10, "Ann", ActiveFlag::Bool(true), "yesterday")],
            now(),
        );
        assert_eq!(outcome.records[0].join_date, now());
        assert_eq!(outcome.issues[0].kind, JoinIssueKind::InvalidJoinEpoch);
        assert_eq!(outcome.issues[0].raw, "yesterday");
    }

    #[test]
    fn bad_expiry_is_none_and_reported() {
        let mut raw = sub(1, "10", "Plan 1");
        raw.expires_on = "soon".to_string();
        let outcome = join_at(&[raw], &[user(10, "Ann", ActiveFlag::Bool(true), "1")], now());
        assert_eq!(outcome.records[0].expires_on, None);
        assert_eq!(outcome.issues[0].kind, JoinIssueKind::InvalidExpiry);
    }

    #[test]
    fn first_user_with_duplicate_id_wins() {
        let outcome = join_at(
            &[sub(1, "10", "Plan 1")],
            &[
                user(10, "First", ActiveFlag::Bool(true), "1"),
                user(10, "Second", ActiveFlag::Bool(false), "1"),
            ],
            now(),
        );
        assert_eq!(outcome.records[0].name, "First Doe");
    }

    #[test]
    fn output_order_matches_subscription_order() {
        let subs = [sub(3, "1", "Plan 1"), sub(1, "2", "Plan 2"), sub(2, "1", "Plan3")];
        let users = [
            user(1, "Ann", ActiveFlag::Bool(true), "1"),
            user(2, "Bob", ActiveFlag::Bool(true), "1"),
        ];
        let ids: Vec<String> = join_at(&subs, &users, now())
            .records
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn unlisted_plan_is_kept_with_zero_revenue() {
        let outcome = join_at(&[sub(1, "10", "Gold")], &[], now());
        assert_eq!(outcome.records[0].plan, Plan::Unlisted("Gold".to_string()));
        assert_eq!(outcome.records[0].revenue, Cents::ZERO);
    }

    #[test]
    fn user_id_with_whitespace_still_matches() {
        let outcome = join_at(
            &[sub(1, " 10 ", "Plan 1")],
            &[user(10, "Ann", ActiveFlag::Bool(true), "1")],
            now(),
        );
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.records[0].name, "Ann Doe");
    }

    #[test]
    fn epoch_parsing_edges() {
        assert_eq!(parse_epoch_seconds(""), None);
        assert_eq!(parse_epoch_seconds("NaN"), None);
        assert_eq!(parse_epoch_seconds("inf"), None);
        assert_eq!(parse_epoch_seconds("12abc"), None);
        assert_eq!(
            parse_epoch_seconds("1.5").map(|d| d.timestamp_millis()),
            Some(1_500)
        );
        assert_eq!(parse_epoch_seconds(" 60 ").map(|d| d.timestamp()), Some(60));
    }

    #[test]
    fn date_formats() {
        assert!(parse_date("2024-02-29").is_some());
        assert!(parse_date("2024-02-30").is_none());
        assert_eq!(
            parse_date("2024-01-01T12:00:00+02:00").map(|d| d.timestamp()),
            parse_date("2024-01-01 10:00:00").map(|d| d.timestamp())
        );
    }
}
