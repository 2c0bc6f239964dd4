pub mod graph_rag;
pub mod knowledge_graph;
pub mod lvi;
pub mod skill_confidence;
pub mod skills;
pub mod trend;
