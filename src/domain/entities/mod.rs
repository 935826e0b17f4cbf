//! Domain entities - Core objects with identity

mod save_node;

pub use save_node::{NodeKind, SaveNode};
