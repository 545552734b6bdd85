pub mod repo;
pub mod services;

pub use repo::{Skill, UserSkill};
