//! Domain layer - Save document model with no I/O
//!
//! This layer contains:
//! - Entities: save nodes (the root and placed objects)
//! - Value Objects: save field names and the project layout

pub mod entities;
pub mod value_objects;
