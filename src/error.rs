use std::path::PathBuf;
use std::{error, fmt, io};

/// Error type for map loading, atlas slicing and map queries.
#[derive(Debug)]
pub enum MapError {
    /// File I/O error while reading a map or tileset document.
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// JSON parse error in a map or tileset document.
    Json {
        /// Path of the document that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
    /// Structurally invalid map input (wrong extension, bad tileset reference).
    InvalidMap(String),
    /// A layer's dimensions or data length disagree with the map's width/height.
    InvalidLayerSize(String),
    /// A tile layer references a gid no tileset covers.
    InvalidTileGid {
        /// Name of the offending layer.
        layer: String,
        /// The out-of-range gid.
        gid: u32,
        /// Highest gid any tileset provides.
        max_gid: u32,
    },
    /// A Tiled property carries a type tag this loader does not understand.
    UnsupportedPropertyType {
        /// Property name.
        name: String,
        /// The unrecognized type tag.
        kind: String,
    },
    /// A tileset image is absent or could not be decoded.
    ImageLoad {
        /// Path of the image.
        path: PathBuf,
        /// Underlying decode error.
        source: image::ImageError,
    },
    /// Tileset geometry that cannot be sliced (zero tile dimensions).
    InvalidTileset(String),
    /// A property or tile query addressed a cell outside the map.
    OutOfBounds {
        /// Queried x coordinate.
        x: i32,
        /// Queried y coordinate.
        y: i32,
        /// Map width in tiles.
        width: u32,
        /// Map height in tiles.
        height: u32,
    },
    /// No layer with the given name exists.
    UnknownLayer(String),
    /// No layer with the given index exists.
    UnknownLayerIndex(usize),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io { path, source } => {
                write!(f, "I/O error reading {}: {}", path.display(), source)
            }
            MapError::Json { path, source } => {
                write!(f, "JSON parse error in {}: {}", path.display(), source)
            }
            MapError::InvalidMap(msg) => write!(f, "Invalid map: {}", msg),
            MapError::InvalidLayerSize(name) => write!(
                f,
                "Invalid layer size for layer '{}': data length does not match map dimensions",
                name
            ),
            MapError::InvalidTileGid {
                layer,
                gid,
                max_gid,
            } => write!(
                f,
                "Layer '{}' references gid {} but the tilesets only cover up to {}",
                layer, gid, max_gid
            ),
            MapError::UnsupportedPropertyType { name, kind } => {
                write!(f, "Property '{}' has unsupported type '{}'", name, kind)
            }
            MapError::ImageLoad { path, source } => {
                write!(f, "Failed to load image {}: {}", path.display(), source)
            }
            MapError::InvalidTileset(msg) => write!(f, "Invalid tileset: {}", msg),
            MapError::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "Coordinates {},{} are outside the {}x{} map",
                x, y, width, height
            ),
            MapError::UnknownLayer(name) => write!(f, "No layer named '{}'", name),
            MapError::UnknownLayerIndex(index) => write!(f, "No layer at index {}", index),
        }
    }
}

impl error::Error for MapError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MapError::Io { source, .. } => Some(source),
            MapError::Json { source, .. } => Some(source),
            MapError::ImageLoad { source, .. } => Some(source),
            _ => None,
        }
    }
}
