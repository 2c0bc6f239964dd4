//! LVI trend chart: the last N weekly snapshots in chronological order.

use anyhow::Result;
use velocity_core::store::Stores;
use velocity_core::trend::LviTrendData;
use velocity_core::VelocityConfig;

pub async fn lvi_trend(stores: &Stores, config: &VelocityConfig) -> Result<LviTrendData> {
    let activity = stores.activity()?;

    let mut snapshots = activity
        .recent_snapshots(&config.service.user_id, config.scoring.snapshot_window)
        .await?;
    snapshots.reverse();

    let data = LviTrendData::from_snapshots(snapshots, config.scoring.trend_threshold_percent);
    tracing::debug!(
        snapshots = data.snapshots.len(),
        trend = ?data.trend,
        percent_change = data.percent_change,
        "Classified LVI trend"
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use velocity_core::store::MemoryStore;
    use velocity_core::trend::Trend;

    #[tokio::test]
    async fn test_demo_history_is_accelerating() {
        let stores = Stores::shared(Arc::new(MemoryStore::demo(Utc::now())));

        let data = lvi_trend(&stores, &VelocityConfig::default()).await.unwrap();
        assert_eq!(data.snapshots.len(), 12);
        assert_eq!(data.trend, Trend::Accelerating);
        assert!(data.percent_change > 0.0);

        let scores: Vec<i32> = data.snapshots.iter().map(|s| s.score).collect();
        assert_eq!(scores.first(), Some(&52));
        assert_eq!(scores.last(), Some(&81));
    }

    #[tokio::test]
    async fn test_window_limits_snapshots() {
        let stores = Stores::shared(Arc::new(MemoryStore::demo(Utc::now())));
        let mut config = VelocityConfig::default();
        config.scoring.snapshot_window = 4;

        let data = lvi_trend(&stores, &config).await.unwrap();
        assert_eq!(data.snapshots.len(), 4);
        // newest four, oldest first
        assert_eq!(data.snapshots.last().map(|s| s.score), Some(81));
    }

    #[tokio::test]
    async fn test_no_history_is_stable() {
        let stores = Stores::shared(Arc::new(MemoryStore::new()));
        let data = lvi_trend(&stores, &VelocityConfig::default()).await.unwrap();
        assert!(data.snapshots.is_empty());
        assert_eq!(data.trend, Trend::Stable);
        assert_eq!(data.percent_change, 0.0);
    }
}
