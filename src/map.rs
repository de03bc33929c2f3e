use crate::atlas::{build_tile_images, DecodedImage, TileImage, TileImageTable, TilesetInfo};
use crate::error::MapError;
use crate::ir_map::{IrLayerKind, IrMap, Properties, TileId};
use crate::loader::json_loader::decode_map_file_to_ir;
use glam::Vec2;
use log::debug;
use std::collections::HashMap;
use std::path::Path;

/// Name of the obstruction layer consulted by [`Map::is_walkable`] unless
/// overridden with [`Map::with_meta_layer`].
pub const DEFAULT_META_LAYER: &str = "Meta";

/// Property name that marks a tile as blocking movement.
pub const COLLIDABLE: &str = "Collidable";

/// One tile layer of a loaded map.
pub struct Layer {
    /// Layer name as it appears in the document.
    pub name: String,
    /// Visibility flag.
    pub visible: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// World-space pixel offset.
    pub offset: Vec2,
    width: u32,
    data: Vec<TileId>,
}

impl Layer {
    /// The gid at `(x, y)`. Callers have already bounds-checked.
    fn gid_at(&self, x: u32, y: u32) -> TileId {
        self.data[(y * self.width + x) as usize]
    }
}

/// A loaded tile map: layers, tileset geometry, per-gid properties and the
/// sliced tile images. Read-only after construction.
pub struct Map {
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
    layers: Vec<Layer>,
    tilesets: Vec<TilesetInfo>,
    gid_lut: Vec<u16>,
    tile_properties: HashMap<u32, Properties>,
    images: TileImageTable,
    meta_layer: Option<usize>,
}

impl Map {
    /// Loads a Tiled JSON map file, decoding its tileset images and slicing
    /// them into the gid-indexed image table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        let (ir, base) = decode_map_file_to_ir(path)?;
        debug!("map directory: {}", base.display());
        Self::from_ir(ir, &base)
    }

    /// Builds a map from decoded IR. Tileset image paths in `ir` are resolved
    /// relative to `base_dir`.
    pub fn from_ir(ir: IrMap, base_dir: &Path) -> Result<Self, MapError> {
        // gid capacity: one past the highest gid any tileset provides.
        let max_gid = ir
            .tilesets
            .iter()
            .map(|t| t.first_gid + t.tilecount)
            .max()
            .unwrap_or(0);

        let mut tilesets = Vec::with_capacity(ir.tilesets.len());
        let mut gid_lut = vec![u16::MAX; max_gid as usize];
        let mut tile_properties = HashMap::new();
        let mut images = TileImageTable::new(max_gid);

        for (i, ts) in ir.tilesets.iter().enumerate() {
            let info = TilesetInfo {
                first_gid: ts.first_gid,
                tilecount: ts.tilecount,
                columns: ts.columns,
                tile_w: ts.tile_w,
                tile_h: ts.tile_h,
                spacing: ts.spacing,
                margin: ts.margin,
            };

            let img_path = base_dir.join(&ts.image);
            let decoded = DecodedImage::open(&img_path)?;
            images.merge(build_tile_images(&info, &decoded, max_gid)?);

            for gid in ts.first_gid..ts.first_gid + ts.tilecount {
                gid_lut[gid as usize] = i as u16;
            }
            for tile in &ts.tiles {
                if !tile.properties.is_empty() {
                    tile_properties.insert(ts.first_gid + tile.id, tile.properties.clone());
                }
            }
            tilesets.push(info);
        }

        let mut layers = Vec::new();
        for layer in ir.layers {
            if let IrLayerKind::Tiles { data, .. } = layer.kind {
                if data.len() != (ir.width * ir.height) as usize {
                    return Err(MapError::InvalidLayerSize(layer.name));
                }
                layers.push(Layer {
                    name: layer.name,
                    visible: layer.visible,
                    opacity: layer.opacity,
                    offset: layer.offset,
                    width: ir.width,
                    data: data.into_iter().map(TileId).collect(),
                });
            }
        }

        let meta_layer = layers.iter().position(|l| l.name == DEFAULT_META_LAYER);

        Ok(Self {
            width: ir.width,
            height: ir.height,
            tile_w: ir.tile_w,
            tile_h: ir.tile_h,
            properties: ir.properties,
            layers,
            tilesets,
            gid_lut,
            tile_properties,
            images,
            meta_layer,
        })
    }

    /// Designates a different obstruction layer for walkability checks.
    ///
    /// Fails with [`MapError::UnknownLayer`] if no such layer exists.
    pub fn with_meta_layer(mut self, name: &str) -> Result<Self, MapError> {
        self.meta_layer = Some(self.layer_index(name)?);
        Ok(self)
    }

    /// The map's tile layers, in document order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The map's tileset geometry, sorted by first gid.
    pub fn tilesets(&self) -> &[TilesetInfo] {
        &self.tilesets
    }

    /// The gid-indexed tile image table built at load time.
    pub fn images(&self) -> &TileImageTable {
        &self.images
    }

    /// Resolves a layer name to its index.
    pub fn layer_index(&self, name: &str) -> Result<usize, MapError> {
        self.layers
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| MapError::UnknownLayer(name.to_owned()))
    }

    fn check_bounds(&self, x: i32, y: i32) -> Result<(u32, u32), MapError> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Err(MapError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok((x as u32, y as u32))
    }

    fn layer(&self, layer_index: usize) -> Result<&Layer, MapError> {
        self.layers
            .get(layer_index)
            .ok_or(MapError::UnknownLayerIndex(layer_index))
    }

    /// The gid at a cell of a layer.
    pub fn gid_at(&self, x: i32, y: i32, layer_index: usize) -> Result<TileId, MapError> {
        let (x, y) = self.check_bounds(x, y)?;
        Ok(self.layer(layer_index)?.gid_at(x, y))
    }

    /// Tileset and local tile id for a gid, if any set covers it.
    pub fn ts_for_gid(&self, gid: TileId) -> Option<(&TilesetInfo, u32)> {
        let clean = gid.clean() as usize;
        if clean >= self.gid_lut.len() {
            return None;
        }
        let idx = self.gid_lut[clean];
        if idx == u16::MAX {
            return None;
        }
        let ts = &self.tilesets[idx as usize];
        Some((ts, gid.clean() - ts.first_gid))
    }

    /// Custom properties of the tile at a cell of a layer.
    ///
    /// `Ok(None)` means the cell is empty or its tile carries no properties;
    /// out-of-range coordinates and layer indices are errors.
    pub fn get_tile_properties(
        &self,
        x: i32,
        y: i32,
        layer_index: usize,
    ) -> Result<Option<&Properties>, MapError> {
        let (x, y) = self.check_bounds(x, y)?;
        let gid = self.layer(layer_index)?.gid_at(x, y);
        if gid.is_empty() {
            return Ok(None);
        }
        Ok(self.tile_properties.get(&gid.clean()))
    }

    /// Whether the tile at `(x, y)` on the named layer carries a property.
    ///
    /// A cell without properties is `Ok(false)`; only an unknown layer name
    /// or out-of-bounds coordinates are errors.
    pub fn has_property(
        &self,
        x: i32,
        y: i32,
        name: &str,
        layer_name: &str,
    ) -> Result<bool, MapError> {
        let layer_index = self.layer_index(layer_name)?;
        let properties = self.get_tile_properties(x, y, layer_index)?;
        Ok(properties.is_some_and(|p| p.contains(name)))
    }

    /// Whether a move onto `(x, y)` is allowed.
    ///
    /// Off-map coordinates are not walkable but never an error; that's the
    /// common case when expanding at map edges. A cell blocks movement when
    /// its tile on the obstruction layer carries [`COLLIDABLE`].
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        let Some(meta) = self.meta_layer else {
            // No obstruction layer: nothing blocks.
            return true;
        };
        match self.get_tile_properties(x, y, meta) {
            Ok(Some(props)) => !props.contains(COLLIDABLE),
            _ => true,
        }
    }

    /// The walkable cells among the four axis-aligned neighbors of `(x, y)`,
    /// in the fixed order north, south, west, east.
    pub fn neighbors(&self, x: i32, y: i32) -> Vec<(i32, i32)> {
        let mut adjacent = Vec::with_capacity(4);
        for (nx, ny) in [(x, y - 1), (x, y + 1), (x - 1, y), (x + 1, y)] {
            if self.is_walkable(nx, ny) {
                adjacent.push((nx, ny));
            }
        }
        adjacent
    }

    /// Image handle for the tile at a cell of a layer, if the cell holds a
    /// tile and its gid was sliced at load time.
    pub fn tile_image(
        &self,
        x: i32,
        y: i32,
        layer_index: usize,
    ) -> Result<Option<&TileImage>, MapError> {
        let gid = self.gid_at(x, y, layer_index)?;
        if gid.is_empty() {
            return Ok(None);
        }
        Ok(self.images.get(gid.clean()))
    }

    /// First cell on the named layer whose tile carries the property, in
    /// row-major scan order.
    pub fn find_tile_with_property(
        &self,
        name: &str,
        layer_name: &str,
    ) -> Result<Option<(i32, i32)>, MapError> {
        let layer_index = self.layer_index(layer_name)?;
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                if self
                    .get_tile_properties(x, y, layer_index)?
                    .is_some_and(|p| p.contains(name))
                {
                    return Ok(Some((x, y)));
                }
            }
        }
        Ok(None)
    }

    /// Every cell on the named layer whose tile carries the property, in
    /// row-major scan order.
    pub fn find_tiles_with_property(
        &self,
        name: &str,
        layer_name: &str,
    ) -> Result<Vec<(i32, i32)>, MapError> {
        let layer_index = self.layer_index(layer_name)?;
        let mut tiles = Vec::new();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                if self
                    .get_tile_properties(x, y, layer_index)?
                    .is_some_and(|p| p.contains(name))
                {
                    tiles.push((x, y));
                }
            }
        }
        Ok(tiles)
    }
}
