//! Per-field exporter dispatch
//!
//! Each node kind has a fixed table from field name to exporter. Fields not
//! in the table use [`FieldExporter::Raw`].

use crate::domain::entities::NodeKind;
use crate::domain::value_objects::save_keys as keys;

/// Script-like fields written to their own text file when non-blank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFile {
    Lua,
    Xml,
}

/// Sub-folder a child object is exported into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildContainer {
    Objects,
    States,
}

/// How a field's value is materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldExporter {
    /// Inline in the node document, or an external file for externalized fields
    Raw,
    Script(ScriptFile),
    ScriptState,
    /// Root decal palette: back up each decal image, then export raw
    DecalPalette,
    /// List of child objects
    ObjectList(ChildContainer),
    /// Map of state id to alternate-state object
    StateMap,
    /// Structured value whose listed roles hold asset URLs, backed up
    /// inside the object's folder
    AssetUrls { roles: &'static [&'static str] },
    /// Map of deck id to deck, each deck holding face and back image URLs;
    /// backed up in the project root so decks share one copy
    DeckImages,
}

const ROOT_EXPORTERS: &[(&str, FieldExporter)] = &[
    (keys::LUA_SCRIPT, FieldExporter::Script(ScriptFile::Lua)),
    (keys::XML_UI, FieldExporter::Script(ScriptFile::Xml)),
    (keys::LUA_SCRIPT_STATE, FieldExporter::ScriptState),
    (keys::DECAL_PALLET, FieldExporter::DecalPalette),
    (keys::OBJECT_STATES, FieldExporter::ObjectList(ChildContainer::Objects)),
];

const OBJECT_EXPORTERS: &[(&str, FieldExporter)] = &[
    (keys::LUA_SCRIPT, FieldExporter::Script(ScriptFile::Lua)),
    (keys::XML_UI, FieldExporter::Script(ScriptFile::Xml)),
    (keys::LUA_SCRIPT_STATE, FieldExporter::ScriptState),
    (keys::STATES, FieldExporter::StateMap),
    (keys::CONTAINED_OBJECTS, FieldExporter::ObjectList(ChildContainer::Objects)),
    (keys::CUSTOM_DECK, FieldExporter::DeckImages),
    (
        keys::CUSTOM_ASSETBUNDLE,
        FieldExporter::AssetUrls {
            roles: &[keys::ASSETBUNDLE_URL, keys::ASSETBUNDLE_SECONDARY_URL],
        },
    ),
    (
        keys::CUSTOM_IMAGE,
        FieldExporter::AssetUrls {
            roles: &[keys::IMAGE_URL, keys::IMAGE_SECONDARY_URL],
        },
    ),
    (
        keys::CUSTOM_MESH,
        FieldExporter::AssetUrls {
            roles: &[
                keys::MESH_URL,
                keys::DIFFUSE_URL,
                keys::NORMAL_URL,
                keys::COLLIDER_URL,
            ],
        },
    ),
    (
        keys::CUSTOM_PDF,
        FieldExporter::AssetUrls {
            roles: &[keys::PDF_URL],
        },
    ),
];

/// Deck URL roles, stored as `<deckId>-<role>`
pub const DECK_ROLES: &[&str] = &[keys::FACE_URL, keys::BACK_URL];

impl FieldExporter {
    /// Most specific exporter for `key` on a node of `kind`
    pub fn for_field(kind: NodeKind, key: &str) -> Self {
        let table = match kind {
            NodeKind::Root => ROOT_EXPORTERS,
            NodeKind::Object => OBJECT_EXPORTERS,
        };
        table
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, exporter)| *exporter)
            .unwrap_or(FieldExporter::Raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_per_node_kind() {
        assert_eq!(
            FieldExporter::for_field(NodeKind::Root, "ObjectStates"),
            FieldExporter::ObjectList(ChildContainer::Objects)
        );
        assert_eq!(
            FieldExporter::for_field(NodeKind::Object, "ObjectStates"),
            FieldExporter::Raw
        );
        assert_eq!(
            FieldExporter::for_field(NodeKind::Object, "States"),
            FieldExporter::StateMap
        );
        assert_eq!(
            FieldExporter::for_field(NodeKind::Root, "DecalPallet"),
            FieldExporter::DecalPalette
        );
        assert_eq!(
            FieldExporter::for_field(NodeKind::Object, "CustomDeck"),
            FieldExporter::DeckImages
        );
    }

    #[test]
    fn test_unknown_fields_use_raw() {
        assert_eq!(FieldExporter::for_field(NodeKind::Root, "NotAField"), FieldExporter::Raw);
        assert_eq!(FieldExporter::for_field(NodeKind::Object, "Transform"), FieldExporter::Raw);
    }

    #[test]
    fn test_mesh_roles() {
        match FieldExporter::for_field(NodeKind::Object, "CustomMesh") {
            FieldExporter::AssetUrls { roles } => assert_eq!(roles.len(), 4),
            other => panic!("unexpected exporter {other:?}"),
        }
    }
}
