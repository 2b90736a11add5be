//! Summary statistics and plan distribution over the full record set.

use serde::Serialize;

use crate::model::{Cents, PlanCode, Status, SubscriberRecord};

/// Headline numbers shown above the subscriber table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_subscribers: usize,
    pub active_subscribers: usize,
    pub total_revenue: Cents,
}

impl SummaryStats {
    #[must_use]
    pub fn from_records(records: &[SubscriberRecord]) -> Self {
        Self {
            total_subscribers: records.len(),
            active_subscribers: records
                .iter()
                .filter(|r| r.status == Status::Active)
                .count(),
            total_revenue: records.iter().map(|r| r.revenue).sum(),
        }
    }
}

/// One bar of the plan distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanShare {
    pub plan: PlanCode,
    pub count: usize,
    /// Share of all records, `0.0..=100.0`.
    pub percentage: f64,
}

impl PlanShare {
    /// Percentage rounded for display.
    #[must_use]
    pub fn rounded_percentage(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = self.percentage.round().clamp(0.0, 100.0) as u32;
        rounded
    }
}

/// Count and share of each known plan, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDistribution {
    pub total: usize,
    pub shares: Vec<PlanShare>,
    /// Records whose plan literal is not one of the known plans.
    pub unlisted: usize,
}

impl PlanDistribution {
    #[must_use]
    pub fn from_records(records: &[SubscriberRecord]) -> Self {
        let total = records.len();
        let shares = PlanCode::ALL
            .into_iter()
            .map(|plan| {
                let count = records
                    .iter()
                    .filter(|r| r.plan.code() == Some(plan))
                    .count();
                PlanShare {
                    plan,
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect();
        let unlisted = records.iter().filter(|r| r.plan.code().is_none()).count();
        Self {
            total,
            shares,
            unlisted,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Plan;
    use chrono::DateTime;

    fn record(plan: Plan, status: Status) -> SubscriberRecord {
        SubscriberRecord {
            id: "1".to_string(),
            name: "n".to_string(),
            email: "e".to_string(),
            revenue: plan.revenue(),
            plan,
            status,
            expires_on: None,
            join_date: DateTime::from_timestamp(0, 0).expect("epoch"),
            country: "NZ".to_string(),
        }
    }

    #[test]
    fn summary_counts_active_and_sums_revenue() {
        let records = vec![
            record(Plan::Known(PlanCode::Plan1), Status::Active),
            record(Plan::Known(PlanCode::Plan2), Status::Expired),
            record(Plan::Unlisted("Gold".into()), Status::Active),
        ];
        let stats = SummaryStats::from_records(&records);
        assert_eq!(stats.total_subscribers, 3);
        assert_eq!(stats.active_subscribers, 2);
        assert_eq!(stats.total_revenue, Cents(999 + 1_799));
    }

    #[test]
    fn empty_set_has_zero_percentages() {
        let dist = PlanDistribution::from_records(&[]);
        assert_eq!(dist.total, 0);
        assert_eq!(dist.shares.len(), PlanCode::ALL.len());
        assert!(dist.shares.iter().all(|s| s.count == 0 && s.percentage == 0.0));
    }

    #[test]
    fn distribution_counts_each_plan_in_display_order() {
        let records = vec![
            record(Plan::Known(PlanCode::Plan1), Status::Active),
            record(Plan::Known(PlanCode::Plan1), Status::Active),
            record(Plan::Known(PlanCode::Unlimited), Status::Active),
            record(Plan::Unlisted("Gold".into()), Status::Active),
        ];
        let dist = PlanDistribution::from_records(&records);
        assert_eq!(dist.shares[0].plan, PlanCode::Plan1);
        assert_eq!(dist.shares[0].count, 2);
        assert_eq!(dist.shares[0].rounded_percentage(), 50);
        assert_eq!(dist.shares[5].plan, PlanCode::Unlimited);
        assert_eq!(dist.shares[5].rounded_percentage(), 25);
        assert_eq!(dist.unlisted, 1);
    }

    #[test]
    fn rounding_follows_nearest() {
        let share = PlanShare {
            plan: PlanCode::Plan3,
            count: 1,
            percentage: percentage(1, 3),
        };
        assert_eq!(share.rounded_percentage(), 33);
        let share = PlanShare {
            percentage: percentage(2, 3),
            ..share
        };
        assert_eq!(share.rounded_percentage(), 67);
    }
}
