pub mod dto;
pub mod repo;
pub mod services;

pub use dto::{BrowseFilters, MatchPage, UserMatch};
