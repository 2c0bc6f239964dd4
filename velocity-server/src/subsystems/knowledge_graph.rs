use anyhow::Result;
use velocity_core::graph::{load_knowledge_graph, KnowledgeGraphData};
use velocity_core::store::Stores;
use velocity_core::VelocityConfig;

pub async fn knowledge_graph(stores: &Stores, config: &VelocityConfig) -> Result<KnowledgeGraphData> {
    let graph = stores.graph()?;
    let data = load_knowledge_graph(graph, &config.service.user_id, config.scoring.suggestion_limit).await?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use velocity_core::store::MemoryStore;

    #[tokio::test]
    async fn test_demo_graph_shape() {
        let stores = Stores::shared(Arc::new(MemoryStore::demo(Utc::now())));
        let data = knowledge_graph(&stores, &VelocityConfig::default()).await.unwrap();

        assert_eq!(data.nodes.len(), 49);
        assert_eq!(data.links.len(), 42 + 38);
        assert_eq!(data.nodes.iter().filter(|n| n.learned).count(), 28);
        assert!(data.suggested_next_skills.len() <= 5);

        for s in &data.suggested_next_skills {
            let node = data.nodes.iter().find(|n| n.id == s.id);
            assert!(node.is_some_and(|n| !n.learned), "{} is already learned", s.id);
        }
    }

    #[tokio::test]
    async fn test_unconfigured_graph_store() {
        let err = knowledge_graph(&Stores::unconfigured(), &VelocityConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Graph store not configured");
    }
}
