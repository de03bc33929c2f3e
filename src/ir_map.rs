use glam::Vec2;
use std::collections::HashMap;

/// Bit set on a gid when the tile is flipped horizontally.
pub const FLIP_H: u32 = 0x8000_0000; // bit 31
/// Bit set on a gid when the tile is flipped vertically.
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
/// Bit set on a gid when the tile is flipped diagonally.
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
/// Mask that strips the flip flags off a raw gid.
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits (bit 28 is free)

/// A global tile id as stored in layer data. 0 means "no tile".
///
/// The top three bits carry Tiled's flip flags; [`TileId::clean`] strips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

impl TileId {
    /// The raw gid including flip flags.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
    /// The gid with flip flags stripped.
    #[inline]
    pub fn clean(self) -> u32 {
        self.0 & GID_MASK
    }
    /// Whether the cell is empty (gid 0).
    #[inline]
    pub fn is_empty(self) -> bool {
        self.clean() == 0
    }
    /// Horizontal flip flag.
    #[inline]
    pub fn flip_h(self) -> bool {
        (self.0 & FLIP_H) != 0
    }
    /// Vertical flip flag.
    #[inline]
    pub fn flip_v(self) -> bool {
        (self.0 & FLIP_V) != 0
    }
    /// Diagonal flip flag.
    #[inline]
    pub fn flip_d(self) -> bool {
        (self.0 & FLIP_D) != 0
    }
}

/// A typed Tiled custom property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean property.
    Bool(bool),
    /// Integer property (Tiled "int" and "object" references).
    I64(i64),
    /// Float property.
    F32(f32),
    /// String-like property ("string", "file", "color", "class").
    String(String),
}

/// A named set of custom properties attached to a map, layer, tileset or tile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: HashMap<String, PropertyValue>,
}

impl Properties {
    /// Creates an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.values.insert(name.into(), value);
    }

    /// Raw value lookup.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Whether a property with this name exists, regardless of its value.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// True when no properties are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of properties present.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterates over `(name, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Boolean property lookup.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(PropertyValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Integer property lookup; `None` if the value does not fit `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        match self.values.get(name) {
            Some(PropertyValue::I64(v)) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Wide integer property lookup.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(PropertyValue::I64(v)) => Some(*v),
            _ => None,
        }
    }

    /// Float property lookup.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.values.get(name) {
            Some(PropertyValue::F32(v)) => Some(*v),
            _ => None,
        }
    }

    /// String property lookup.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(PropertyValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// Canonical, format-agnostic map.
pub struct IrMap {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// Map-level custom properties.
    pub properties: Properties,
    /// Tilesets, sorted by `first_gid`.
    pub tilesets: Vec<IrTileset>,
    /// Layers in document order.
    pub layers: Vec<IrLayer>,
}

/// One image atlas with a regular tile grid.
pub struct IrTileset {
    /// First gid assigned to this set. Always >= 1.
    pub first_gid: u32,
    /// Image path, relative to the map document.
    pub image: String,
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// Number of tiles the set declares.
    pub tilecount: u32,
    /// Declared column count of the atlas grid.
    pub columns: u32,
    /// Pixels between tiles. 0 if not used.
    pub spacing: u32,
    /// Border offset in pixels. 0 if not used.
    pub margin: u32,
    /// Tileset-level custom properties.
    pub properties: Properties,
    /// Per-tile metadata, keyed by local tile id.
    pub tiles: Vec<IrTileMetadata>,
}

/// Custom metadata attached to one tile of a tileset.
pub struct IrTileMetadata {
    /// Local tile id within the set (gid = `first_gid + id`).
    pub id: u32,
    /// The tile's custom properties.
    pub properties: Properties,
}

/// Layer payload variants.
pub enum IrLayerKind {
    /// A grid of raw gids (flip flags included).
    Tiles {
        /// Layer width in tiles; always matches the map's.
        width: usize,
        /// Layer height in tiles; always matches the map's.
        height: usize,
        /// Row-major gid data, length `width * height`.
        data: Vec<u32>,
    },
    /// A layer kind this loader does not model (object or image layers).
    Unsupported,
}

/// One layer of the map.
pub struct IrLayer {
    /// Layer name as it appears in the document.
    pub name: String,
    /// Visibility flag.
    pub visible: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// World-space pixel offset for this layer.
    pub offset: Vec2,
    /// Layer-level custom properties.
    pub properties: Properties,
    /// Layer payload.
    pub kind: IrLayerKind,
}
