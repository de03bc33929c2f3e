//! Tile atlas slicing: turning one tileset image into per-gid tile regions.
//!
//! Region y coordinates use a bottom-left origin, because the renderers this
//! feeds treat textures bottom-up. [`TileImage::crop`] converts back to the
//! buffer's top-down rows when extracting pixels.

use crate::error::MapError;
use image::RgbaImage;
use log::debug;
use std::path::Path;
use std::sync::Arc;

/// Slicing geometry for one tileset.
#[derive(Debug, Clone)]
pub struct TilesetInfo {
    /// First gid assigned to this set.
    pub first_gid: u32,
    /// Number of tiles the set declares.
    pub tilecount: u32,
    /// Declared column count of the atlas grid.
    pub columns: u32,
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// Pixels between tiles.
    pub spacing: u32,
    /// Border offset in pixels.
    pub margin: u32,
}

/// A rectangular sub-region of a tileset image, y measured from the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRegion {
    /// Left edge in pixels.
    pub x: u32,
    /// Bottom edge in pixels (bottom-left origin).
    pub y: u32,
    /// Region width in pixels.
    pub width: u32,
    /// Region height in pixels.
    pub height: u32,
}

/// A decoded tileset image.
///
/// The pixel buffer is shared, so the [`TileImage`] handles handed out by
/// [`DecodedImage::get_region`] stay cheap to clone.
#[derive(Clone)]
pub struct DecodedImage {
    pixels: Arc<RgbaImage>,
}

impl DecodedImage {
    /// Decodes the image at `path`.
    pub fn open(path: &Path) -> Result<Self, MapError> {
        debug!("loading tile image at {}", path.display());
        let img = image::open(path)
            .map_err(|source| MapError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        Ok(Self::from_image(img))
    }

    /// Wraps an already-decoded pixel buffer.
    pub fn from_image(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Hands out a region of this image; `y` is measured from the bottom.
    pub fn get_region(&self, x: u32, y: u32, width: u32, height: u32) -> TileImage {
        TileImage {
            pixels: Arc::clone(&self.pixels),
            region: TileRegion {
                x,
                y,
                width,
                height,
            },
        }
    }
}

/// An opaque handle to one tile's sub-region of a tileset image.
#[derive(Clone)]
pub struct TileImage {
    pixels: Arc<RgbaImage>,
    region: TileRegion,
}

impl TileImage {
    /// The region this handle covers, y bottom-origin.
    pub fn region(&self) -> TileRegion {
        self.region
    }

    /// Extracts the tile's pixels as an owned image.
    pub fn crop(&self) -> RgbaImage {
        let r = self.region;
        // Region y is bottom-origin; the buffer stores rows top-down.
        let top = self
            .pixels
            .height()
            .saturating_sub(r.y)
            .saturating_sub(r.height);
        image::imageops::crop_imm(&*self.pixels, r.x, top, r.width, r.height).to_image()
    }
}

/// Dense gid-indexed table of tile image handles. Index 0 (empty) and any
/// gid no tileset covers stay unset.
#[derive(Clone, Default)]
pub struct TileImageTable {
    entries: Vec<Option<TileImage>>,
}

impl TileImageTable {
    /// Creates a table with `max_gid` unset entries.
    pub fn new(max_gid: u32) -> Self {
        Self {
            entries: vec![None; max_gid as usize],
        }
    }

    /// Table length (the map's gid capacity).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of populated entries.
    pub fn populated(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Image handle for a gid, if one was sliced for it.
    pub fn get(&self, gid: u32) -> Option<&TileImage> {
        self.entries.get(gid as usize)?.as_ref()
    }

    pub(crate) fn set(&mut self, gid: u32, image: TileImage) {
        if let Some(slot) = self.entries.get_mut(gid as usize) {
            *slot = Some(image);
        }
    }

    /// Moves every populated entry of `other` into this table.
    pub(crate) fn merge(&mut self, other: TileImageTable) {
        for (gid, entry) in other.entries.into_iter().enumerate() {
            if entry.is_some() {
                if let Some(slot) = self.entries.get_mut(gid) {
                    *slot = entry;
                }
            }
        }
    }
}

/// Slices a tileset image into per-gid tile regions.
///
/// Walks the image row-major from `margin` in steps of tile size plus
/// spacing, assigning sequential gids from `first_gid`. Positions whose right
/// edge falls outside the usable width are skipped but still consume a gid.
/// A declared `tilecount` caps how many gids the set may populate, so an
/// image taller than the tile grid cannot bleed into another set's range.
/// The returned table has `max_gid` entries; only this set's retained gids
/// are populated.
pub fn build_tile_images(
    ts: &TilesetInfo,
    image: &DecodedImage,
    max_gid: u32,
) -> Result<TileImageTable, MapError> {
    if ts.tile_w == 0 || ts.tile_h == 0 {
        return Err(MapError::InvalidTileset(format!(
            "degenerate tile size {}x{}",
            ts.tile_w, ts.tile_h
        )));
    }

    let img_w = i64::from(image.width());
    let img_h = i64::from(image.height());
    let tile_w = i64::from(ts.tile_w);
    let tile_h = i64::from(ts.tile_h);
    let spacing = i64::from(ts.spacing);
    let margin = i64::from(ts.margin);
    let step_w = tile_w + spacing;
    let step_h = tile_h + spacing;

    // Some tileset images are slightly larger than the tile area, e.g. when a
    // banner or copyright strip is baked in. Keep whole steps only.
    let true_w = (img_w - margin * 2 + spacing) / step_w * step_w - spacing;
    let true_h = (img_h - margin * 2 + spacing) / step_h * step_h - spacing;
    debug!(
        "tileset image {}x{} with {}x{} steps, true size {}x{}",
        img_w, img_h, step_w, step_h, true_w, true_h
    );

    // Trim off any pixels on the right side that aren't part of a column.
    let edge = true_w - (img_w - margin) % step_w;

    let mut table = TileImageTable::new(max_gid);
    let mut gid = ts.first_gid;

    let mut y = margin;
    while y < margin + true_h {
        let mut x = margin;
        while x < margin + true_w {
            let real_gid = gid;
            gid += 1;
            let tx = x;
            x += step_w;

            if tx + tile_w - spacing > edge {
                continue;
            }
            if real_gid >= max_gid {
                continue;
            }
            if ts.tilecount > 0 && real_gid - ts.first_gid >= ts.tilecount {
                continue;
            }

            // Invert y for the bottom-origin texture convention.
            let flipped = img_h - y - tile_h;
            if flipped < 0 {
                continue;
            }
            table.set(
                real_gid,
                image.get_region(tx as u32, flipped as u32, ts.tile_w, ts.tile_h),
            );
        }
        y += step_h;
    }

    Ok(table)
}
