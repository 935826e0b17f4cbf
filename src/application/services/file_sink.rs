//! File sink - pending artifacts of an export, written in one flush
//!
//! Traversal never touches the filesystem. Every artifact (a node's JSON
//! document, an externalized field, a script, a resource placeholder) is
//! accumulated here under its project-relative path and written by
//! [`FileSink::flush`].

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use indicatif::ProgressBar;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::application::ports::outbound::ResourceFetchPort;
use crate::application::services::resource_registry::{
    FetchOutcome, RegisteredPath, ResourceRegistry,
};
use crate::infrastructure::atomic_write::atomic_write;

/// Errors that abort a flush
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// JSON object under construction
///
/// Writes to an already populated key are conflicts: they are logged and
/// counted, and the last write wins.
#[derive(Debug, Clone, Default)]
pub struct JsonDocument {
    label: String,
    fields: Map<String, Value>,
    conflicts: usize,
}

impl JsonDocument {
    /// Empty document; `label` names it in log messages
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fields: Map::new(),
            conflicts: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    pub fn set_field(&mut self, key: &str, value: Value) {
        if self.fields.contains_key(key) {
            warn!(document = %self.label, field = %key, "Multiple assignment");
            self.conflicts += 1;
        }
        self.fields.insert(key.to_string(), value);
    }

    /// Set `key.subkey`, creating `key` as an empty object if needed
    pub fn set_nested_field(&mut self, key: &str, subkey: &str, value: Value) {
        let conflict = match self.fields.get(key) {
            None => {
                warn!(document = %self.label, field = %key, subfield = %subkey, "Adding to missing key");
                false
            }
            Some(Value::Object(inner)) => inner.contains_key(subkey),
            Some(_) => {
                warn!(document = %self.label, field = %key, "Replacing non-object value with object");
                true
            }
        };
        if conflict {
            warn!(document = %self.label, field = %key, subfield = %subkey, "Multiple assignment");
            self.conflicts += 1;
        }

        let slot = self
            .fields
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(inner) = slot {
            inner.insert(subkey.to_string(), value);
        }
    }

    /// Append to the list at `key`, creating it if needed
    pub fn append_field(&mut self, key: &str, value: Value) {
        let slot = self.fields.entry(key.to_string()).or_insert_with(|| {
            warn!(document = %self.label, field = %key, "Appending to missing key");
            Value::Array(Vec::new())
        });
        if !slot.is_array() {
            warn!(document = %self.label, field = %key, "Appending to non-list value");
            self.conflicts += 1;
            let previous = slot.take();
            *slot = Value::Array(vec![previous]);
        }
        if let Value::Array(items) = slot {
            items.push(value);
        }
    }

}

/// One pending output file
#[derive(Debug, Clone)]
pub enum Artifact {
    /// A node's primary document
    Document(JsonDocument),
    /// Any JSON value, written pretty-printed
    Json(Value),
    /// Text written as-is (scripts, UI markup, raw script state)
    Text(String),
    /// Backup of an external resource; the path is extended during flush
    Resource(RegisteredPath),
    /// Provenance report of the resource registry, rendered during flush
    ProvenanceLog,
}

/// Counters and failures of one flush
#[derive(Debug, Clone, Default)]
pub struct FlushReport {
    pub written: usize,
    pub downloaded: usize,
    pub copied: usize,
    pub skipped: usize,
    pub failures: Vec<ResourceFailure>,
}

#[derive(Debug, Clone)]
pub struct ResourceFailure {
    pub url: String,
    pub path: String,
    pub error: String,
}

/// Accumulator of every artifact of one export
pub struct FileSink {
    base_path: PathBuf,
    entries: IndexMap<String, Artifact>,
    conflicts: usize,
}

impl FileSink {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            entries: IndexMap::new(),
            conflicts: 0,
        }
    }

    /// Register or replace the artifact at `path`
    pub fn put(&mut self, path: impl Into<String>, artifact: Artifact) {
        let path = path.into();
        if let Artifact::Document(doc) = &artifact {
            self.conflicts += doc.conflicts();
        }
        if self.entries.contains_key(&path) {
            warn!(path = %path, "Artifact replaced");
            self.conflicts += 1;
        }
        self.entries.insert(path, artifact);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Conflicting writes seen so far (replaced artifacts and duplicate keys)
    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    /// Write every artifact and fetch every resource
    ///
    /// Extensions of every registered resource are resolved first so the
    /// provenance report can name final paths, including references whose
    /// artifact was replaced. Write failures abort the flush; fetch failures are
    /// collected in the report and the flush continues.
    #[instrument(skip_all, fields(base = %self.base_path.display(), artifacts = self.entries.len()))]
    pub async fn flush(
        &self,
        registry: &mut ResourceRegistry,
        fetcher: &dyn ResourceFetchPort,
        progress: &ProgressBar,
    ) -> Result<FlushReport, SinkError> {
        registry.resolve_all(&self.base_path, fetcher).await;

        let mut report = FlushReport::default();
        progress.set_length(self.entries.len() as u64);

        for (path, artifact) in &self.entries {
            let full_path = self.base_path.join(path);
            progress.set_message(format!("Exporting: {}", full_path.display()));

            match artifact {
                Artifact::Document(doc) => {
                    self.write(path, &full_path, &pretty_json(&doc.fields)?).await?;
                    report.written += 1;
                }
                Artifact::Json(value) => {
                    self.write(path, &full_path, &pretty_json(value)?).await?;
                    report.written += 1;
                }
                Artifact::Text(text) => {
                    self.write(path, &full_path, text.as_bytes()).await?;
                    report.written += 1;
                }
                Artifact::ProvenanceLog => {
                    let log = registry.provenance_report();
                    self.write(path, &full_path, &pretty_json(&log)?).await?;
                    report.written += 1;
                }
                Artifact::Resource(resource) => {
                    let extension = registry
                        .get(&resource.url)
                        .and_then(|request| request.resolved_extension())
                        .unwrap_or("")
                        .to_string();
                    let dest = self.base_path.join(format!("{path}{extension}"));

                    match registry.fetch(&resource.url, &dest, fetcher).await {
                        FetchOutcome::Downloaded { bytes } => {
                            debug!(path = %dest.display(), bytes, "Resource downloaded");
                            report.downloaded += 1;
                        }
                        FetchOutcome::Copied => report.copied += 1,
                        FetchOutcome::Skipped => report.skipped += 1,
                        FetchOutcome::Failed(error) => report.failures.push(ResourceFailure {
                            url: resource.url.clone(),
                            path: format!("{path}{extension}"),
                            error,
                        }),
                    }
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!(
            written = report.written,
            downloaded = report.downloaded,
            copied = report.copied,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Flush complete"
        );
        Ok(report)
    }

    async fn write(&self, path: &str, full_path: &Path, data: &[u8]) -> Result<(), SinkError> {
        debug!(path = %full_path.display(), "Writing artifact");
        atomic_write(full_path, data)
            .await
            .map_err(|source| SinkError::Io {
                path: path.to_string(),
                source,
            })
    }
}

/// Tab-indented JSON, non-ASCII characters kept verbatim
pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}
