use anyhow::Result;
use velocity_core::graph::{load_top_confidence, RadarDataPoint};
use velocity_core::store::Stores;
use velocity_core::VelocityConfig;

pub async fn skill_confidence(stores: &Stores, config: &VelocityConfig) -> Result<Vec<RadarDataPoint>> {
    let graph = stores.graph()?;
    let points = load_top_confidence(graph, &config.service.user_id, config.scoring.radar_size).await?;
    Ok(points)
}
