pub mod activity;
pub mod skill;
pub mod snapshot;

pub use activity::{Complexity, Session, SkillApplication};
pub use skill::{EdgeKind, LearnedSkill, Skill, SkillCategory, SkillEdge};
pub use snapshot::LviSnapshot;
