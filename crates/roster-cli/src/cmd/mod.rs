pub mod link;
pub mod list;
pub mod stats;

use anyhow::Result;
use chrono::Utc;
use roster_core::SubscriberRecord;
use roster_core::config::{DataConfig, EffectiveConfig};
use roster_core::join_at;
use roster_core::load::{load_subscriptions, load_users};
use std::path::Path;
use tracing::{debug, info};

/// Load both collections named in `[data]` and join them.
pub fn load_records(project_root: &Path, data: &DataConfig) -> Result<Vec<SubscriberRecord>> {
    let subs_path = EffectiveConfig::resolve_path(project_root, &data.subscriptions);
    let users_path = EffectiveConfig::resolve_path(project_root, &data.users);

    let subscriptions = load_subscriptions(&subs_path)?;
    let users = load_users(&users_path)?;

    let outcome = join_at(&subscriptions, &users, Utc::now());
    if outcome.issues.is_empty() {
        debug!(records = outcome.records.len(), "joined records");
    } else {
        info!(
            records = outcome.records.len(),
            issues = outcome.issues.len(),
            "joined records with data-quality fallbacks"
        );
    }
    Ok(outcome.records)
}
