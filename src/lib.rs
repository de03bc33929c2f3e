#![warn(missing_docs)]

//! Tiled JSON tile-map model with atlas slicing and grid pathfinding.
//!
//! Loading runs bottom-up: the JSON loader decodes a map document and its
//! external tilesets into an IR, each tileset image is sliced into per-gid
//! tile regions, and the resulting [`Map`] answers bounds-safe property,
//! walkability and neighbor queries. [`find_path`] searches over those
//! queries on demand.

mod atlas;
mod error;
mod ir_map;
mod loader {
    pub mod json_loader;
}
mod map;
mod path;

pub use atlas::{
    build_tile_images, DecodedImage, TileImage, TileImageTable, TileRegion, TilesetInfo,
};
pub use error::MapError;
pub use ir_map::{
    IrLayer, IrLayerKind, IrMap, IrTileMetadata, IrTileset, Properties, PropertyValue, TileId,
};
pub use loader::json_loader::decode_map_file_to_ir;
pub use map::{Layer, Map, COLLIDABLE, DEFAULT_META_LAYER};
pub use path::{find_path, find_path_with_rng, GridNav};
