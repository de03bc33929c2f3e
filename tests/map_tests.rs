// tests/map_tests.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tiled_nav::{find_path, find_path_with_rng, Map, MapError, TileId};

fn temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("tiled_nav_{tag}_{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

/// 3x3 map with a Ground layer everywhere and a Meta layer whose center cell
/// carries a Collidable tile. The tileset image is two 16px tiles side by
/// side; tile id 1 (gid 2) is the collidable one.
fn write_meta_map(dir: &Path) -> PathBuf {
    let map_json = r#"{
      "width": 3,
      "height": 3,
      "tilewidth": 16,
      "tileheight": 16,
      "layers": [
        {
          "type":"tilelayer",
          "name":"Ground",
          "width":3,
          "height":3,
          "data":[1,1,1,1,1,1,1,1,1]
        },
        {
          "type":"tilelayer",
          "name":"Meta",
          "width":3,
          "height":3,
          "data":[0,0,0,0,2,0,0,0,0]
        }
      ],
      "tilesets":[{"firstgid":1,"source":"tileset.json"}]
    }"#;

    let tileset_json = r#"{
      "tilewidth":16,
      "tileheight":16,
      "tilecount":2,
      "columns":2,
      "image":"tiles.png",
      "tiles":[
        {
          "id":1,
          "properties":[{"name":"Collidable","type":"bool","value":true}]
        }
      ]
    }"#;

    let map_path = dir.join("map.json");
    fs::write(&map_path, map_json).expect("failed to write map");
    fs::write(dir.join("tileset.json"), tileset_json).expect("failed to write tileset");
    image::RgbaImage::new(32, 16)
        .save(dir.join("tiles.png"))
        .expect("failed to write tileset image");
    map_path
}

fn load_meta_map(tag: &str) -> Map {
    let dir = temp_dir(tag);
    let map_path = write_meta_map(&dir);
    Map::load(&map_path).expect("map should load")
}

#[test]
fn walkability_matches_collidable_property() {
    let map = load_meta_map("walkable");
    for y in 0..3 {
        for x in 0..3 {
            let collidable = map
                .has_property(x, y, "Collidable", "Meta")
                .expect("in-bounds query");
            assert_eq!(map.is_walkable(x, y), !collidable, "cell {x},{y}");
        }
    }
    assert!(!map.is_walkable(1, 1));
    assert!(map.is_walkable(0, 0));
}

#[test]
fn out_of_bounds_is_not_walkable_and_queries_fail() {
    let map = load_meta_map("oob");
    for (x, y) in [(-1, 0), (0, -1), (3, 0), (0, 3), (100, 100)] {
        assert!(!map.is_walkable(x, y), "{x},{y} should not be walkable");
        let err = map
            .get_tile_properties(x, y, 0)
            .err()
            .expect("expected bounds error");
        assert!(matches!(err, MapError::OutOfBounds { .. }));
    }
}

#[test]
fn neighbors_are_walkable_in_bounds_and_ordered() {
    let map = load_meta_map("neighbors");

    // North, south, west, east; off-map and collidable cells omitted.
    assert_eq!(map.neighbors(0, 0), vec![(0, 1), (1, 0)]);
    assert_eq!(map.neighbors(1, 0), vec![(0, 0), (2, 0)]);
    assert_eq!(map.neighbors(2, 1), vec![(2, 0), (2, 2)]);
    assert_eq!(map.neighbors(1, 2), vec![(0, 2), (2, 2)]);

    for y in 0..3 {
        for x in 0..3 {
            let adjacent = map.neighbors(x, y);
            assert!(adjacent.len() <= 4);
            for &(nx, ny) in &adjacent {
                assert!((nx, ny) != (x, y));
                assert!(map.is_walkable(nx, ny));
                assert_eq!((nx - x).abs() + (ny - y).abs(), 1);
            }
        }
    }
}

#[test]
fn empty_cells_and_plain_tiles_have_no_properties() {
    let map = load_meta_map("props");
    let meta = map.layer_index("Meta").expect("Meta layer exists");
    let ground = map.layer_index("Ground").expect("Ground layer exists");

    // Empty Meta cell.
    assert!(map.get_tile_properties(0, 0, meta).expect("query").is_none());
    // Ground tile exists but carries no custom properties.
    assert!(map
        .get_tile_properties(0, 0, ground)
        .expect("query")
        .is_none());
    // The collidable tile reports its property set.
    let props = map
        .get_tile_properties(1, 1, meta)
        .expect("query")
        .expect("collidable tile has properties");
    assert!(props.contains("Collidable"));
    assert_eq!(props.get_bool("Collidable"), Some(true));
}

#[test]
fn unknown_layers_are_typed_errors() {
    let map = load_meta_map("layers");

    let err = map
        .has_property(0, 0, "Collidable", "Nope")
        .err()
        .expect("expected layer error");
    assert!(matches!(err, MapError::UnknownLayer(name) if name == "Nope"));

    let err = map
        .get_tile_properties(0, 0, 9)
        .err()
        .expect("expected layer error");
    assert!(matches!(err, MapError::UnknownLayerIndex(9)));

    let err = load_meta_map("layers2")
        .with_meta_layer("Missing")
        .err()
        .expect("expected layer error");
    assert!(matches!(err, MapError::UnknownLayer(_)));
}

#[test]
fn property_scans_locate_collidable_cells() {
    let map = load_meta_map("scan");
    assert_eq!(
        map.find_tile_with_property("Collidable", "Meta")
            .expect("scan"),
        Some((1, 1))
    );
    assert_eq!(
        map.find_tiles_with_property("Collidable", "Meta")
            .expect("scan"),
        vec![(1, 1)]
    );
    assert_eq!(
        map.find_tiles_with_property("Spawn", "Meta").expect("scan"),
        Vec::new()
    );
}

#[test]
fn tile_images_resolve_through_the_gid_table() {
    let map = load_meta_map("images");
    let ground = map.layer_index("Ground").expect("Ground layer exists");
    let meta = map.layer_index("Meta").expect("Meta layer exists");

    // Two 16x16 tiles were sliced from the 32x16 atlas.
    assert_eq!(map.images().populated(), 2);

    let tile = map
        .tile_image(0, 0, ground)
        .expect("query")
        .expect("ground cell has an image");
    let region = tile.region();
    assert_eq!((region.width, region.height), (16, 16));

    // Empty Meta cells have no image.
    assert!(map.tile_image(0, 0, meta).expect("query").is_none());

    let (ts, local) = map.ts_for_gid(TileId(2)).expect("gid 2 is covered");
    assert_eq!(ts.first_gid, 1);
    assert_eq!(local, 1);
    assert!(map.ts_for_gid(TileId(99)).is_none());
}

#[test]
fn pathfinding_respects_the_meta_layer() {
    let map = load_meta_map("path");

    // Both routes around the blocked center are 5 cells long.
    let mut rng = StdRng::seed_from_u64(11);
    let path = find_path_with_rng(&map, (0, 0), (2, 2), &mut rng);
    assert_eq!(path.len(), 5);
    assert!(!path.contains(&(1, 1)));
    assert_eq!(path.first(), Some(&(0, 0)));
    assert_eq!(path.last(), Some(&(2, 2)));
    for pair in path.windows(2) {
        assert!(map.neighbors(pair[0].0, pair[0].1).contains(&pair[1]));
    }

    assert_eq!(find_path(&map, (0, 0), (0, 0)), vec![(0, 0)]);
    // The blocked center is unreachable as a goal.
    let mut rng = StdRng::seed_from_u64(12);
    assert!(find_path_with_rng(&map, (0, 0), (1, 1), &mut rng).is_empty());
}

#[test]
fn map_reports_its_dimensions() {
    let map = load_meta_map("dims");
    assert_eq!((map.width, map.height), (3, 3));
    assert_eq!((map.tile_w, map.tile_h), (16, 16));
    assert_eq!(map.layers().len(), 2);
    assert_eq!(map.tilesets().len(), 1);
}
