//! Field names of the Tabletop Simulator save format
//!
//! Pure data: the canonical field lists for the save root and for placed
//! objects, the fields that are always written to their own file, and the
//! fallback extensions used when an asset URL gives no better hint.

// Save root
pub const SAVE_NAME: &str = "SaveName";
pub const EPOCH_TIME: &str = "EpochTime";
pub const DATE: &str = "Date";
pub const VERSION_NUMBER: &str = "VersionNumber";
pub const GAME_MODE: &str = "GameMode";
pub const GAME_TYPE: &str = "GameType";
pub const GAME_COMPLEXITY: &str = "GameComplexity";
pub const PLAYING_TIME: &str = "PlayingTime";
pub const PLAYER_COUNTS: &str = "PlayerCounts";
pub const TAGS: &str = "Tags";
pub const GRAVITY: &str = "Gravity";
pub const PLAY_AREA: &str = "PlayArea";
pub const TABLE: &str = "Table";
pub const SKY: &str = "Sky";
pub const SKY_URL: &str = "SkyURL";
pub const NOTE: &str = "Note";
pub const GRID: &str = "Grid";
pub const COMPONENT_TAGS: &str = "ComponentTags";
pub const TURNS: &str = "Turns";
pub const DECAL_PALLET: &str = "DecalPallet";
pub const TABLE_URL: &str = "TableURL";
pub const RULES: &str = "Rules";
pub const TAB_STATES: &str = "TabStates";
pub const CAMERA_STATES: &str = "CameraStates";
pub const SNAP_POINTS: &str = "SnapPoints";
pub const LUA_SCRIPT_STATE: &str = "LuaScriptState";
pub const OBJECT_STATES: &str = "ObjectStates";
pub const HANDS: &str = "Hands";
pub const LIGHTING: &str = "Lighting";
pub const MUSIC_PLAYER: &str = "MusicPlayer";
pub const TAG_STATES: &str = "TagStates";
pub const LUA_SCRIPT: &str = "LuaScript";
pub const XML_UI: &str = "XmlUI";

// Placed objects
pub const ATTACHED_SNAP_POINTS: &str = "AttachedSnapPoints";
pub const AUTORAISE: &str = "Autoraise";
pub const COLOR_DIFFUSE: &str = "ColorDiffuse";
pub const CUSTOM_ASSETBUNDLE: &str = "CustomAssetbundle";
pub const CUSTOM_DECK: &str = "CustomDeck";
pub const CUSTOM_IMAGE: &str = "CustomImage";
pub const CUSTOM_MESH: &str = "CustomMesh";
pub const DECK_IDS: &str = "DeckIDs";
pub const DESCRIPTION: &str = "Description";
pub const GM_NOTES: &str = "GMNotes";
pub const GRID_PROJECTION: &str = "GridProjection";
pub const GUID: &str = "GUID";
pub const HIDDEN_WHEN_FACE_DOWN: &str = "HiddenWhenFaceDown";
pub const IGNORE_FOW: &str = "IgnoreFoW";
pub const LOCKED: &str = "Locked";
pub const MATERIAL_INDEX: &str = "MaterialIndex";
pub const MESH_INDEX: &str = "MeshIndex";
pub const NAME: &str = "Name";
pub const NICKNAME: &str = "Nickname";
pub const NUMBER: &str = "Number";
pub const SIDEWAYS_CARD: &str = "SidewaysCard";
pub const SNAP: &str = "Snap";
pub const STATES: &str = "States";
pub const STICKY: &str = "Sticky";
pub const TOOLTIP: &str = "Tooltip";
pub const TRANSFORM: &str = "Transform";
pub const CARD_ID: &str = "CardID";
pub const BAG: &str = "Bag";
pub const COUNTER: &str = "Counter";
pub const CUSTOM_PDF: &str = "CustomPDF";
pub const DRAG_SELECTABLE: &str = "DragSelectable";
pub const HIDE_WHEN_FACE_DOWN: &str = "HideWhenFaceDown";
pub const JOINT_HINGE: &str = "JointHinge";
pub const LAYOUT_GROUP_SORT_INDEX: &str = "LayoutGroupSortIndex";
pub const MEASURE_MOVEMENT: &str = "MeasureMovement";
pub const PHYSICS_MATERIAL: &str = "PhysicsMaterial";
pub const RIGID_BODY: &str = "Rigidbody";
pub const TEXT: &str = "Text";
pub const VALUE: &str = "Value";
pub const CONTAINED_OBJECTS: &str = "ContainedObjects";
pub const ROTATION_VALUES: &str = "RotationValues";

// URL roles inside structured asset fields
pub const IMAGE_URL: &str = "ImageURL";
pub const FACE_URL: &str = "FaceURL";
pub const BACK_URL: &str = "BackURL";
pub const ASSETBUNDLE_URL: &str = "AssetbundleURL";
pub const ASSETBUNDLE_SECONDARY_URL: &str = "AssetbundleSecondaryURL";
pub const IMAGE_SECONDARY_URL: &str = "ImageSecondaryURL";
pub const MESH_URL: &str = "MeshURL";
pub const DIFFUSE_URL: &str = "DiffuseURL";
pub const NORMAL_URL: &str = "NormalURL";
pub const COLLIDER_URL: &str = "ColliderURL";
pub const PDF_URL: &str = "PDFUrl";

/// Canonical field order of the save root
pub const ROOT_FIELDS: &[&str] = &[
    SAVE_NAME,
    EPOCH_TIME,
    DATE,
    VERSION_NUMBER,
    GAME_MODE,
    GAME_TYPE,
    GAME_COMPLEXITY,
    PLAYING_TIME,
    PLAYER_COUNTS,
    TAGS,
    GRAVITY,
    PLAY_AREA,
    TABLE,
    SKY,
    SKY_URL,
    NOTE,
    GRID,
    COMPONENT_TAGS,
    TURNS,
    DECAL_PALLET,
    TABLE_URL,
    RULES,
    TAB_STATES,
    CAMERA_STATES,
    SNAP_POINTS,
    LUA_SCRIPT_STATE,
    OBJECT_STATES,
    HANDS,
    LIGHTING,
    MUSIC_PLAYER,
    TAG_STATES,
    LUA_SCRIPT,
    XML_UI,
];

/// Root fields that always get their own file under the external folder
pub const ROOT_EXTERNAL_FIELDS: &[&str] = &[
    GRID,
    LIGHTING,
    HANDS,
    TURNS,
    TAB_STATES,
    CAMERA_STATES,
    DECAL_PALLET,
];

/// Canonical field order of a placed object
pub const OBJECT_FIELDS: &[&str] = &[
    GUID,
    NAME,
    NICKNAME,
    DESCRIPTION,
    TOOLTIP,
    GM_NOTES,
    VALUE,
    NUMBER,
    STICKY,
    LOCKED,
    AUTORAISE,
    HANDS,
    IGNORE_FOW,
    HIDDEN_WHEN_FACE_DOWN,
    HIDE_WHEN_FACE_DOWN,
    SIDEWAYS_CARD,
    DRAG_SELECTABLE,
    SNAP,
    GRID,
    GRID_PROJECTION,
    LAYOUT_GROUP_SORT_INDEX,
    MEASURE_MOVEMENT,
    CARD_ID,
    DECK_IDS,
    CUSTOM_DECK,
    TEXT,
    COUNTER,
    MATERIAL_INDEX,
    MESH_INDEX,
    CUSTOM_ASSETBUNDLE,
    CUSTOM_MESH,
    PHYSICS_MATERIAL,
    RIGID_BODY,
    CUSTOM_PDF,
    CUSTOM_IMAGE,
    BAG,
    JOINT_HINGE,
    COLOR_DIFFUSE,
    TRANSFORM,
    ATTACHED_SNAP_POINTS,
    ROTATION_VALUES,
    STATES,
    CONTAINED_OBJECTS,
    XML_UI,
    LUA_SCRIPT_STATE,
    LUA_SCRIPT,
];

/// Placed objects never externalize plain fields
pub const OBJECT_EXTERNAL_FIELDS: &[&str] = &[];

/// Extension used for a downloaded asset when neither the URL nor the
/// server reveal one.
pub fn fallback_extension(key: &str) -> Option<&'static str> {
    match key {
        SKY_URL | TABLE_URL | IMAGE_URL | IMAGE_SECONDARY_URL | DIFFUSE_URL | FACE_URL
        | BACK_URL => Some(".img-x"),
        ASSETBUNDLE_URL | ASSETBUNDLE_SECONDARY_URL | MESH_URL | COLLIDER_URL => Some(".bin"),
        NORMAL_URL => Some(".bin-x"),
        PDF_URL => Some(".pdf"),
        _ => None,
    }
}
