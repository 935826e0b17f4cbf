//! Export Service - explodes a save document into a project folder
//!
//! The export walks the save depth-first. Every node assembles its own
//! `main.json` document privately: child objects are exported first and only
//! their folder names are written into the parent. Finished documents, script
//! files, externalized fields and resource placeholders all go into one
//! [`FileSink`], which is flushed to disk once traversal has finished.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::application::ports::outbound::ResourceFetchPort;
use crate::application::services::field_exporter::{
    ChildContainer, FieldExporter, ScriptFile, DECK_ROLES,
};
use crate::application::services::file_sink::{
    Artifact, FileSink, FlushReport, JsonDocument, SinkError,
};
use crate::application::services::resource_registry::{is_url, ResourceRegistry};
use crate::domain::entities::SaveNode;
use crate::domain::value_objects::save_keys::{self as keys, fallback_extension};
use crate::domain::value_objects::{join_path, path_segment, ProjectLayout};
use crate::infrastructure::save_file::{load_save_document, LoadError};

/// Errors that abort an export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Summary of one export run
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// Placed objects exported (contained objects and states included)
    pub objects: usize,
    /// `<document>: <field>` for every field missing from the schema
    pub unknown_fields: Vec<String>,
    pub conflicts: usize,
    pub folder_collisions: usize,
    /// Distinct resource URLs registered
    pub resources: usize,
    pub flush: FlushReport,
}

/// Service exploding save documents into project folders
pub struct ExportService {
    layout: ProjectLayout,
    fetcher: Arc<dyn ResourceFetchPort>,
    fetch_delay: Duration,
    show_progress: bool,
}

impl ExportService {
    pub fn new(
        layout: ProjectLayout,
        fetcher: Arc<dyn ResourceFetchPort>,
        fetch_delay: Duration,
    ) -> Self {
        Self {
            layout,
            fetcher,
            fetch_delay,
            show_progress: false,
        }
    }

    /// Show a progress bar while flushing
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Load the save at `document_path` and export it under `project_path`
    ///
    /// Nothing is written when the save cannot be loaded.
    #[instrument(skip(self), fields(document = %document_path.display(), project = %project_path.display()))]
    pub async fn export(
        &self,
        document_path: &Path,
        project_path: &Path,
        backup_enabled: bool,
    ) -> Result<ExportReport, ExportError> {
        let fields = load_save_document(document_path)?;
        info!(fields = fields.len(), "Save loaded");
        self.export_document(fields, project_path, backup_enabled)
            .await
    }

    /// Export an already parsed save document under `project_path`
    pub async fn export_document(
        &self,
        fields: Map<String, Value>,
        project_path: &Path,
        backup_enabled: bool,
    ) -> Result<ExportReport, ExportError> {
        let mut run = ExportRun::new(&self.layout, project_path, self.fetch_delay);
        run.export_node(SaveNode::root(fields, backup_enabled));
        if backup_enabled {
            run.sink
                .put(self.layout.guid_map_path(), Artifact::ProvenanceLog);
        }

        let ExportRun {
            sink,
            mut registry,
            mut report,
            ..
        } = run;
        report.conflicts = sink.conflicts();
        report.resources = registry.len();
        info!(
            artifacts = sink.len(),
            objects = report.objects,
            resources = report.resources,
            "Traversal complete"
        );

        let progress = self.progress_bar();
        report.flush = sink
            .flush(&mut registry, self.fetcher.as_ref(), &progress)
            .await?;
        Ok(report)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    }
}

/// Mutable state of a single export run
struct ExportRun<'a> {
    layout: &'a ProjectLayout,
    sink: FileSink,
    registry: ResourceRegistry,
    /// Object folders already taken in this run
    claimed: HashSet<String>,
    report: ExportReport,
}

impl<'a> ExportRun<'a> {
    fn new(layout: &'a ProjectLayout, project_path: &Path, fetch_delay: Duration) -> Self {
        Self {
            layout,
            sink: FileSink::new(project_path),
            registry: ResourceRegistry::new(fetch_delay),
            claimed: HashSet::new(),
            report: ExportReport::default(),
        }
    }

    /// Export every field of `node`, returning its folder name
    fn export_node(&mut self, mut node: SaveNode) -> String {
        if !node.is_root() {
            self.report.objects += 1;
        }
        let mut doc = JsonDocument::new(node.path(&self.layout.main_file));

        for (key, value) in node.take_fields() {
            if !node.is_known(&key) {
                warn!(document = %doc.label(), field = %key, "Unknown key");
                self.report
                    .unknown_fields
                    .push(format!("{}: {}", doc.label(), key));
            }
            self.export_field(&node, &mut doc, &key, value);
        }

        debug!(document = %doc.label(), "Node exported");
        let label = doc.label().to_string();
        self.sink.put(label, Artifact::Document(doc));
        node.folder_name().unwrap_or_default().to_string()
    }

    fn export_field(&mut self, node: &SaveNode, doc: &mut JsonDocument, key: &str, value: Value) {
        let layout = self.layout;

        match FieldExporter::for_field(node.kind(), key) {
            FieldExporter::Raw => self.export_raw(node, doc, key, value),

            FieldExporter::Script(file) => match value {
                Value::String(text) if !text.trim().is_empty() => {
                    let name = match file {
                        ScriptFile::Lua => &layout.lua_file,
                        ScriptFile::Xml => &layout.xml_file,
                    };
                    self.sink.put(node.path(name), Artifact::Text(text));
                }
                value => self.export_raw(node, doc, key, value),
            },

            FieldExporter::ScriptState => match value {
                value if is_blank(&value) => self.export_raw(node, doc, key, value),
                Value::String(text) => {
                    self.sink
                        .put(node.path(&layout.lua_state_raw_file), Artifact::Text(text));
                }
                value => {
                    self.sink
                        .put(node.path(&layout.lua_state_file), Artifact::Json(value));
                }
            },

            FieldExporter::DecalPalette => {
                if node.backup_enabled() {
                    for (index, decal) in value.as_array().into_iter().flatten().enumerate() {
                        if let Some(url) = url_at(decal, keys::IMAGE_URL) {
                            let stem = join_path(&layout.backup_dir, &format!("{key}/{index}"));
                            self.register_resource(
                                node.owner_id(),
                                url,
                                stem,
                                fallback_extension(keys::IMAGE_URL),
                            );
                        }
                    }
                }
                self.export_raw(node, doc, key, value);
            }

            FieldExporter::ObjectList(container) => match value {
                Value::Array(entries) => {
                    doc.set_field(key, Value::Array(Vec::new()));
                    for entry in entries {
                        let pointer = match entry {
                            Value::Object(fields) => {
                                Value::String(self.export_child(node, fields, container))
                            }
                            other => {
                                warn!(document = %doc.label(), field = %key, "Non-object entry kept inline");
                                other
                            }
                        };
                        doc.append_field(key, pointer);
                    }
                }
                value => self.export_raw(node, doc, key, value),
            },

            FieldExporter::StateMap => match value {
                Value::Object(states) => {
                    doc.set_field(key, Value::Object(Map::new()));
                    for (state_key, state) in states {
                        let pointer = match state {
                            Value::Object(fields) => Value::String(self.export_child(
                                node,
                                fields,
                                ChildContainer::States,
                            )),
                            other => {
                                warn!(document = %doc.label(), field = %key, state = %state_key, "Non-object state kept inline");
                                other
                            }
                        };
                        doc.set_nested_field(key, &state_key, pointer);
                    }
                }
                value => self.export_raw(node, doc, key, value),
            },

            FieldExporter::AssetUrls { roles } => {
                let mut assets = Vec::new();
                if node.backup_enabled() && !is_blank(&value) {
                    for role in roles {
                        if let Some(url) = url_at(&value, role) {
                            let stem = node.path(&join_path(
                                &layout.backup_dir,
                                &format!("{key}/{role}"),
                            ));
                            assets.push((url.to_string(), stem, *role));
                        }
                    }
                }
                self.export_raw(node, doc, key, value);
                for (url, stem, role) in assets {
                    self.register_resource(node.owner_id(), &url, stem, fallback_extension(role));
                }
            }

            FieldExporter::DeckImages => {
                let mut assets = Vec::new();
                if node.backup_enabled() {
                    for (deck_id, deck) in value.as_object().into_iter().flatten() {
                        if is_blank(deck) {
                            continue;
                        }
                        for role in DECK_ROLES {
                            if let Some(url) = url_at(deck, role) {
                                let stem = join_path(
                                    &layout.backup_dir,
                                    &format!("{key}/{}-{role}", path_segment(deck_id)),
                                );
                                assets.push((url.to_string(), stem, *role));
                            }
                        }
                    }
                }
                self.export_raw(node, doc, key, value);
                for (url, stem, role) in assets {
                    self.register_resource(node.owner_id(), &url, stem, fallback_extension(role));
                }
            }
        }
    }

    /// Default exporter: external file for externalized fields, otherwise
    /// inline in the node document (backing up plain URL values first)
    fn export_raw(&mut self, node: &SaveNode, doc: &mut JsonDocument, key: &str, value: Value) {
        let layout = self.layout;

        if node.is_externalized(key) {
            let path = node.path(&join_path(&layout.external_dir, &format!("{key}.json")));
            self.sink.put(path, Artifact::Json(value));
            return;
        }

        if node.backup_enabled() {
            if let Some(url) = value.as_str().filter(|s| is_url(s)) {
                let stem = node.path(&join_path(&layout.backup_dir, &path_segment(key)));
                self.register_resource(node.owner_id(), url, stem, fallback_extension(key));
            }
        }
        doc.set_field(key, value);
    }

    /// Export a child object into `container` under `parent`, returning the
    /// folder name the parent should point to
    fn export_child(
        &mut self,
        parent: &SaveNode,
        fields: Map<String, Value>,
        container: ChildContainer,
    ) -> String {
        let layout = self.layout;
        let dir = match container {
            ChildContainer::Objects => &layout.objects_dir,
            ChildContainer::States => &layout.states_dir,
        };
        let mut child = SaveNode::object(fields, parent, dir);

        if !self.claimed.insert(child.output_path().to_string()) {
            let original = child.output_path().to_string();
            let mut n = 2;
            loop {
                child.disambiguate(n);
                if self.claimed.insert(child.output_path().to_string()) {
                    break;
                }
                n += 1;
            }
            warn!(folder = %original, renamed = %child.output_path(), "Folder name collision");
            self.report.folder_collisions += 1;
        }

        self.export_node(child)
    }

    fn register_resource(&mut self, owner: &str, url: &str, stem: String, fallback: Option<&str>) {
        let registered = self.registry.register(owner, url, move |_| stem, None, fallback);
        self.sink
            .put(registered.stem.clone(), Artifact::Resource(registered));
    }
}

/// URL string stored under `key` of `value`, if it is one
fn url_at<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
    value.get(key).and_then(Value::as_str).filter(|s| is_url(s))
}

/// Empty, zero, false or null
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
