//! Project folder layout value object
//!
//! Every folder and file name an export writes. Deserializable so the
//! `[layout]` table of the configuration file can override any of them.

use serde::{Deserialize, Serialize};

/// Names of the folders and files that make up an exploded project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectLayout {
    // Folders
    pub external_dir: String,
    pub backup_dir: String,
    pub objects_dir: String,
    pub states_dir: String,

    // Files
    pub main_file: String,
    pub lua_file: String,
    pub lua_state_file: String,
    pub lua_state_raw_file: String,
    pub xml_file: String,
    pub guid_map_file: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            external_dir: "core".to_string(),
            backup_dir: "bin".to_string(),
            objects_dir: "objects".to_string(),
            states_dir: "states".to_string(),
            main_file: "main.json".to_string(),
            lua_file: "main.ttslua".to_string(),
            lua_state_file: "state.json".to_string(),
            lua_state_raw_file: "state.txt".to_string(),
            xml_file: "main.xml".to_string(),
            guid_map_file: "__GUID_MAP__.json".to_string(),
        }
    }
}

impl ProjectLayout {
    /// Project-relative path of the resource provenance report
    pub fn guid_map_path(&self) -> String {
        join_path(&self.backup_dir, &self.guid_map_file)
    }
}

/// Join two project-relative path segments with `/`, skipping empty ones
pub fn join_path(base: &str, segment: &str) -> String {
    match (base.is_empty(), segment.is_empty()) {
        (true, _) => segment.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{}/{}", base.trim_end_matches('/'), segment),
    }
}

/// Make a document-supplied string safe to use as one path component
///
/// Separators become `_`, and a segment that is empty or made only of dots
/// has every character replaced with `_`, so it never names the current or
/// parent directory.
pub fn path_segment(raw: &str) -> String {
    let segment = raw.replace(['/', '\\'], "_");
    if segment.chars().all(|c| c == '.') {
        return "_".repeat(segment.len().max(1));
    }
    segment
}
