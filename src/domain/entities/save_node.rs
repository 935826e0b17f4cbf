//! Save node entity - one subtree of a save document
//!
//! A node is either the save root or a placed object (a top-level object,
//! an object contained in a bag/deck, or an alternate state of an object).
//! Nodes own the raw fields of their subtree; the backup flag is decided once
//! at the root and copied into every descendant.

use serde_json::{Map, Value};

use crate::domain::value_objects::{join_path, path_segment, save_keys};

/// Owner id recorded for resources referenced by the save root
pub const ROOT_OWNER_ID: &str = "_save_";

const UNKNOWN_NAME: &str = "UNKNOWN";
const UNKNOWN_GUID: &str = "ffffff";

/// Which part of the save a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Object,
}

/// One subtree of the save document awaiting export
#[derive(Debug, Clone)]
pub struct SaveNode {
    kind: NodeKind,
    fields: Map<String, Value>,
    /// Directory holding this node's folder (empty for the root)
    parent_dir: String,
    folder_name: Option<String>,
    output_path: String,
    guid: String,
    name: String,
    backup_enabled: bool,
}

impl SaveNode {
    /// Create the root node of a save document
    pub fn root(fields: Map<String, Value>, backup_enabled: bool) -> Self {
        Self {
            kind: NodeKind::Root,
            fields,
            parent_dir: String::new(),
            folder_name: None,
            output_path: String::new(),
            guid: ROOT_OWNER_ID.to_string(),
            name: String::new(),
            backup_enabled,
        }
    }

    /// Create a placed object under `container_dir` of `parent`
    ///
    /// The object's folder is `<parent>/<container_dir>/<Name>.<GUID>`.
    pub fn object(fields: Map<String, Value>, parent: &SaveNode, container_dir: &str) -> Self {
        let guid = field_label(&fields, save_keys::GUID, UNKNOWN_GUID);
        let name = field_label(&fields, save_keys::NAME, UNKNOWN_NAME);
        let folder_name = folder_name(&name, &guid);
        let parent_dir = join_path(&parent.output_path, container_dir);
        let output_path = join_path(&parent_dir, &folder_name);

        Self {
            kind: NodeKind::Object,
            fields,
            parent_dir,
            folder_name: Some(folder_name),
            output_path,
            guid,
            name,
            backup_enabled: parent.backup_enabled,
        }
    }

    /// Move the object to `<Name>.<GUID>.<n>` after a sibling already took its folder
    pub fn disambiguate(&mut self, n: usize) {
        if self.kind == NodeKind::Root {
            return;
        }
        let folder = format!("{}.{}", folder_name(&self.name, &self.guid), n);
        self.output_path = join_path(&self.parent_dir, &folder);
        self.folder_name = Some(folder);
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }

    /// Directory (relative to the project root) this node's artifacts go under
    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    /// `<Name>.<GUID>` folder name; `None` for the root
    pub fn folder_name(&self) -> Option<&str> {
        self.folder_name.as_deref()
    }

    /// Id recorded in the resource provenance log
    pub fn owner_id(&self) -> &str {
        &self.guid
    }

    pub fn backup_enabled(&self) -> bool {
        self.backup_enabled
    }

    /// Project-relative path of `segment` inside this node's folder
    pub fn path(&self, segment: &str) -> String {
        join_path(&self.output_path, segment)
    }

    pub fn known_fields(&self) -> &'static [&'static str] {
        match self.kind {
            NodeKind::Root => save_keys::ROOT_FIELDS,
            NodeKind::Object => save_keys::OBJECT_FIELDS,
        }
    }

    pub fn externalized_fields(&self) -> &'static [&'static str] {
        match self.kind {
            NodeKind::Root => save_keys::ROOT_EXTERNAL_FIELDS,
            NodeKind::Object => save_keys::OBJECT_EXTERNAL_FIELDS,
        }
    }

    pub fn is_known(&self, key: &str) -> bool {
        self.known_fields().contains(&key)
    }

    pub fn is_externalized(&self, key: &str) -> bool {
        self.externalized_fields().contains(&key)
    }

    /// Take every field out of the node in visit order
    ///
    /// Known fields come first in schema order, then the remaining fields in
    /// the order they appear in the document. Each field is returned once.
    pub fn take_fields(&mut self) -> Vec<(String, Value)> {
        let mut remaining = std::mem::take(&mut self.fields);
        let mut ordered = Vec::with_capacity(remaining.len());

        for key in self.known_fields() {
            if let Some((key, value)) = remaining.shift_remove_entry(*key) {
                ordered.push((key, value));
            }
        }
        ordered.extend(remaining);
        ordered
    }
}

/// Derive `<Name>.<GUID>` as a single path component
pub fn folder_name(name: &str, guid: &str) -> String {
    path_segment(&format!("{name}.{guid}"))
}

fn field_label(fields: &Map<String, Value>, key: &str, default: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}
