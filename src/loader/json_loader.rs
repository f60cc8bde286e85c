// src/loader/json_loader.rs
use crate::command::EditOp;
use crate::error::TilesetError;
use crate::spatial::{GridRect, PixelRect, TileId};
use crate::tileset::{Frame, Tile, Tileset, TilesetKind};
use crate::wang::{WangId, WangSet, WangSetType};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
struct JsonTileset {
    #[serde(default)]
    name: String,
    tilewidth: i32,
    tileheight: i32,
    #[serde(default)]
    tilecount: u32,
    #[serde(default)]
    columns: i32,
    #[serde(default)]
    rows: Option<i32>,
    #[serde(default)]
    margin: i32,
    #[serde(default)]
    spacing: i32,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    kind: Option<TilesetKind>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
    #[serde(default)]
    wangsets: Vec<JsonWangSet>,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    #[serde(default)]
    width: Option<i32>,
    #[serde(default)]
    height: Option<i32>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    imagewidth: Option<i32>,
    #[serde(default)]
    imageheight: Option<i32>,
    #[serde(default)]
    animation: Vec<JsonFrame>,
}

#[derive(Deserialize)]
struct JsonFrame {
    tileid: u32,
    duration: u32,
}

#[derive(Deserialize)]
struct JsonWangSet {
    name: String,
    #[serde(default, rename = "type")]
    kind: WangSetType,
    #[serde(default)]
    colors: Vec<serde_json::Value>,
    #[serde(default)]
    wangtiles: Vec<JsonWangTile>,
}

#[derive(Deserialize)]
struct JsonWangTile {
    tileid: u32,
    wangid: [u8; 8],
}

/// Reads and parses a `.json` file, rejecting every other extension.
pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, TilesetError> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(TilesetError::UnsupportedFormat(format!(
            "expected a .json file: {}",
            path.display()
        )));
    }
    let txt = std::fs::read_to_string(path).map_err(|source| TilesetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&txt).map_err(|source| TilesetError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn invalid(err: impl std::fmt::Display) -> TilesetError {
    TilesetError::InvalidTileset(err.to_string())
}

impl JsonTile {
    fn frames(&self) -> Vec<Frame> {
        self.animation
            .iter()
            .map(|f| Frame {
                tile: TileId(f.tileid),
                duration_ms: f.duration,
            })
            .collect()
    }

    fn rect(&self, default_width: i32, default_height: i32) -> PixelRect {
        PixelRect::new(
            self.x,
            self.y,
            self.width.or(self.imagewidth).unwrap_or(default_width),
            self.height.or(self.imageheight).unwrap_or(default_height),
        )
    }
}

fn tileset_from_json(j: JsonTileset) -> Result<Tileset, TilesetError> {
    if j.tilewidth <= 0 || j.tileheight <= 0 {
        return Err(invalid(format!(
            "tile size must be positive, got {}x{}",
            j.tilewidth, j.tileheight
        )));
    }

    let kind = j.kind.unwrap_or(if j.image.is_some() {
        TilesetKind::Grid
    } else {
        TilesetKind::Collection
    });
    let rows = match j.rows {
        Some(rows) => rows,
        None if j.columns > 0 => (j.tilecount as i32 + j.columns - 1) / j.columns,
        None => 0,
    };

    let mut ts = Tileset::new(j.name, kind, j.tilewidth, j.tileheight)
        .with_grid(j.columns.max(0), rows.max(0))
        .with_margin_spacing(j.margin, j.spacing);
    ts.image = j.image;

    let tiles = match kind {
        TilesetKind::Grid => {
            let layout = ts.layout();
            let columns = ts.columns;
            if columns <= 0 && j.tilecount > 0 {
                return Err(invalid("grid tileset without columns"));
            }
            let mut tiles: Vec<Tile> = (0..j.tilecount)
                .map(|i| {
                    let (col, row) = (i as i32 % columns, i as i32 / columns);
                    Tile::new(TileId(i), layout.pixel_rect(GridRect::new(col, row, 1, 1)))
                })
                .collect();
            for extra in &j.tiles {
                let tile = tiles
                    .get_mut(extra.id as usize)
                    .ok_or_else(|| invalid(format!("tile {} is outside the grid", extra.id)))?;
                tile.animation = extra.frames();
            }
            tiles
        }
        TilesetKind::Atlas if j.tiles.is_empty() => {
            ts.fill_unit_tiles();
            Vec::new()
        }
        TilesetKind::Atlas | TilesetKind::Collection => {
            let tiles: Vec<Tile> = j
                .tiles
                .iter()
                .map(|t| {
                    let mut tile = Tile::new(TileId(t.id), t.rect(j.tilewidth, j.tileheight));
                    tile.image_source = t.image.clone();
                    tile.animation = t.frames();
                    tile
                })
                .collect();
            if kind == TilesetKind::Atlas {
                check_atlas_ids(&ts, &tiles)?;
            }
            tiles
        }
    };
    if !tiles.is_empty() {
        ts.apply(&EditOp::AddTiles(tiles)).map_err(invalid)?;
    }

    for set in j.wangsets {
        let mut wang_set = WangSet::new(set.name, set.kind, set.colors.len().min(u8::MAX as usize) as u8);
        for wt in set.wangtiles {
            wang_set.set_wang_id(TileId(wt.tileid), WangId { colors: wt.wangid });
        }
        ts.wang_sets.push(wang_set);
    }

    log::debug!(
        "Loaded tileset '{}' ({:?}, {} tiles, {} Wang sets)",
        ts.name,
        ts.kind,
        ts.tile_count(),
        ts.wang_sets.len()
    );
    Ok(ts)
}

/// Atlas cells are looked up by the id generated from their grid position,
/// so every atlas tile must carry exactly that id.
fn check_atlas_ids(ts: &Tileset, tiles: &[Tile]) -> Result<(), TilesetError> {
    let layout = ts.layout();
    for tile in tiles {
        let pos = layout.grid_pos(tile.image_rect);
        let expected = ts.generate_tile_id(pos.col, pos.row);
        if tile.id != expected {
            return Err(invalid(format!(
                "atlas tile {} at cell ({}, {}) must have id {}",
                tile.id.0, pos.col, pos.row, expected.0
            )));
        }
    }
    Ok(())
}

/// Parses a tileset from a JSON string.
pub fn load_tileset_from_str(json: &str) -> Result<Tileset, TilesetError> {
    let j: JsonTileset = serde_json::from_str(json)?;
    tileset_from_json(j)
}

/// Reads and parses a `.json` tileset file.
pub fn load_tileset_from_file(path: impl AsRef<Path>) -> Result<Tileset, TilesetError> {
    let path = path.as_ref();
    let j: JsonTileset = read_json_file(path)?;
    tileset_from_json(j)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TileGrid, TilesetModel};
    use crate::spatial::{tile_id_from_atlas_coords, Cell};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mq_tileset_loader_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    #[test]
    fn grid_tileset_gets_unit_tiles_and_animation() {
        let json = r#"{
          "name": "terrain",
          "tilewidth": 16,
          "tileheight": 16,
          "tilecount": 6,
          "columns": 3,
          "margin": 1,
          "spacing": 2,
          "image": "terrain.png",
          "tiles": [
            {"id": 4, "animation": [{"tileid": 4, "duration": 100}, {"tileid": 5, "duration": 150}]}
          ]
        }"#;
        let ts = load_tileset_from_str(json).expect("load");
        assert_eq!(ts.kind, TilesetKind::Grid);
        assert_eq!((ts.columns, ts.rows), (3, 2));
        assert_eq!(ts.tile_count(), 6);
        assert_eq!(ts.image.as_deref(), Some("terrain.png"));

        let tile = ts.find_tile(TileId(4)).unwrap();
        assert_eq!(tile.image_rect, PixelRect::new(1 + 18, 1 + 18, 16, 16));
        assert_eq!(tile.animation.len(), 2);
        assert_eq!(tile.animation[1], Frame { tile: TileId(5), duration_ms: 150 });
    }

    #[test]
    fn atlas_tiles_keep_their_rects() {
        let json = r#"{
          "tilewidth": 16, "tileheight": 16, "columns": 4, "rows": 2,
          "image": "atlas.png", "kind": "atlas",
          "tiles": [
            {"id": 0, "x": 0, "y": 0, "width": 32, "height": 32},
            {"id": 2, "x": 32, "y": 0, "width": 16, "height": 16}
          ]
        }"#;
        let ts = load_tileset_from_str(json).expect("load");
        assert!(ts.is_atlas());
        assert_eq!(ts.find_tile(TileId(0)).unwrap().image_rect, PixelRect::new(0, 0, 32, 32));
        assert_eq!(ts.tile_count(), 2);
    }

    #[test]
    fn atlas_ids_must_match_their_cells() {
        let wrong = r#"{"tilewidth": 16, "tileheight": 16, "columns": 2, "rows": 2, "kind": "atlas",
                        "tiles": [{"id": 1, "x": 0, "y": 16}]}"#;
        assert!(matches!(load_tileset_from_str(wrong), Err(TilesetError::InvalidTileset(_))));

        let right = r#"{"tilewidth": 16, "tileheight": 16, "columns": 2, "rows": 2, "kind": "atlas",
                        "tiles": [{"id": 65536, "x": 0, "y": 16}]}"#;
        let ts = load_tileset_from_str(right).expect("load");
        let model = TilesetModel::new(&ts);
        let tile = model.tile_at(Cell::new(1, 0)).expect("tile");
        assert_eq!(tile.id, tile_id_from_atlas_coords(0, 1));
    }

    #[test]
    fn empty_atlas_is_filled_with_unit_tiles() {
        let json = r#"{"tilewidth": 8, "tileheight": 8, "columns": 2, "rows": 2, "kind": "atlas"}"#;
        let ts = load_tileset_from_str(json).expect("load");
        assert_eq!(ts.tile_count(), 4);
        assert!(ts.find_tile(tile_id_from_atlas_coords(1, 1)).is_some());
    }

    #[test]
    fn collection_and_wang_sets() {
        let json = r#"{
          "name": "props",
          "tilewidth": 64, "tileheight": 64, "tilecount": 2, "columns": 0,
          "tiles": [
            {"id": 3, "image": "tree.png", "imagewidth": 48, "imageheight": 64},
            {"id": 7, "image": "rock.png", "imagewidth": 32, "imageheight": 32}
          ],
          "wangsets": [{
            "name": "paths", "type": "edge",
            "colors": [{"name": "dirt"}, {"name": "stone"}],
            "wangtiles": [{"tileid": 3, "wangid": [1, 0, 1, 0, 2, 0, 2, 0]}]
          }]
        }"#;
        let ts = load_tileset_from_str(json).expect("load");
        assert!(ts.is_collection());
        let tree = ts.find_tile(TileId(3)).unwrap();
        assert_eq!(tree.image_source.as_deref(), Some("tree.png"));
        assert_eq!(tree.image_rect, PixelRect::new(0, 0, 48, 64));

        let set = &ts.wang_sets[0];
        assert_eq!(set.kind, WangSetType::Edge);
        assert_eq!(set.color_count, 2);
        assert_eq!(set.wang_id_of_tile(TileId(3)).colors, [1, 0, 1, 0, 2, 0, 2, 0]);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            load_tileset_from_str(r#"{"tilewidth": 0, "tileheight": 16}"#),
            Err(TilesetError::InvalidTileset(_))
        ));
        assert!(matches!(
            load_tileset_from_str(r#"{"tilewidth": 16"#),
            Err(TilesetError::Json { .. })
        ));
        // Atlas tiles must sit on the grid.
        let unaligned = r#"{"tilewidth": 16, "tileheight": 16, "columns": 2, "rows": 2, "kind": "atlas",
                            "tiles": [{"id": 0, "x": 5, "y": 0, "width": 16, "height": 16}]}"#;
        assert!(matches!(load_tileset_from_str(unaligned), Err(TilesetError::InvalidTileset(_))));
    }

    #[test]
    fn file_loading_checks_extension_and_reports_path() {
        let dir = temp_dir();
        let good = dir.join("tiles.json");
        fs::write(&good, r#"{"tilewidth": 8, "tileheight": 8, "tilecount": 1, "columns": 1, "image": "a.png"}"#)
            .expect("write");
        assert_eq!(load_tileset_from_file(&good).expect("load").tile_count(), 1);

        let tsx = dir.join("tiles.tsx");
        fs::write(&tsx, "<tileset/>").expect("write");
        assert!(matches!(
            load_tileset_from_file(&tsx),
            Err(TilesetError::UnsupportedFormat(_))
        ));

        let missing = dir.join("missing.json");
        match load_tileset_from_file(&missing) {
            Err(TilesetError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected io error, got {:?}", other.map(|t| t.name)),
        }
    }
}
