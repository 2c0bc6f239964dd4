//! Current-week LVI card
//!
//! Window: Sunday 00:00 through Saturday 23:59:59.999 containing `now`.
//! Sessions and applications are both selected by their timestamp within
//! the window; the calculator itself never sees the window.

use anyhow::Result;
use chrono::{DateTime, Utc};
use velocity_core::lvi::{compute_lvi, week_window, LviData};
use velocity_core::store::Stores;
use velocity_core::VelocityConfig;

pub async fn current_lvi(stores: &Stores, config: &VelocityConfig, now: DateTime<Utc>) -> Result<LviData> {
    let activity = stores.activity()?;
    let user_id = config.service.user_id.as_str();
    let window = week_window(now);

    let sessions = activity.sessions_between(user_id, window.start, window.end).await?;
    let applications = activity.applications_between(user_id, window.start, window.end).await?;

    let metrics = compute_lvi(&sessions, &applications, config.scoring.scale);
    tracing::debug!(
        user_id,
        week_start = %window.start_label(),
        sessions = sessions.len(),
        applications = applications.len(),
        score = metrics.score,
        "Computed weekly LVI"
    );

    Ok(LviData::from_metrics(
        metrics,
        config.scoring.scale,
        &window,
        config.scoring.min_display_time_to_mastery,
    ))
}
