//! Value objects - Immutable objects defined by their attributes

mod layout;
pub mod save_keys;

pub use layout::{join_path, path_segment, ProjectLayout};
