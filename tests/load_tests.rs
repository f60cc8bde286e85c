// tests/load_tests.rs

use macroquad_tileset_editor::{
    load_tileset_from_file, load_tileset_from_str, TileGrid, TilesetError, TilesetModel, ViewOptions,
};
use std::fs;
use std::path::PathBuf;

const ATLAS_JSON: &str = r#"
{
    "name": "dungeon",
    "kind": "atlas",
    "tilewidth": 16,
    "tileheight": 16,
    "columns": 4,
    "rows": 4,
    "image": "dungeon.png",
    "tiles": [
        { "id": 0, "x": 0, "y": 0, "width": 32, "height": 32 },
        { "id": 2, "x": 32, "y": 0, "width": 16, "height": 16 }
    ]
}
"#;

#[test]
fn integration_load_from_file_and_str() {
    let ts = load_tileset_from_str(ATLAS_JSON).expect("should parse inline JSON");
    assert_eq!(ts.name, "dungeon");
    assert_eq!(ts.tile_count(), 2);

    let mut path = PathBuf::from(std::env::temp_dir());
    path.push("test_tileset_integration.json");
    fs::write(&path, ATLAS_JSON).unwrap();
    let from_file = load_tileset_from_file(&path).unwrap();
    assert_eq!(from_file, ts);
    fs::remove_file(&path).unwrap();

    let model = TilesetModel::new(&ts);
    assert_eq!(model.span_size_at(macroquad_tileset_editor::Cell::new(0, 0)), (2, 2));
}

#[test]
fn integration_unsupported_format() {
    let err = load_tileset_from_file("foo.tsx").unwrap_err();
    match err {
        TilesetError::UnsupportedFormat(msg) => assert!(msg.contains("foo.tsx")),
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }
}

#[test]
fn view_options_drive_column_override() -> anyhow::Result<()> {
    let options = ViewOptions::load_from_str(r#"{ "wrap": "dynamic", "draw_grid": false }"#)?;
    let ts = load_tileset_from_str(ATLAS_JSON)?;
    let mut model = TilesetModel::new(&ts);

    options.refresh_column_count(&mut model, 128.0);
    assert_eq!(model.column_count(), 8);
    assert_eq!(model.row_count(), 2);
    assert!(!model.is_unwrapped());

    options.refresh_column_count(&mut model, 64.0);
    assert!(model.is_unwrapped());
    Ok(())
}
