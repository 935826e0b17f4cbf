//! Application services - Use case implementations
//!
//! The export pipeline: [`ExportService`] walks the save, dispatching each
//! field through [`FieldExporter`], collects output in a [`FileSink`] and
//! deduplicates asset backups in a [`ResourceRegistry`].

pub mod export_service;
pub mod field_exporter;
pub mod file_sink;
pub mod resource_registry;

pub use export_service::{ExportReport, ExportService};
