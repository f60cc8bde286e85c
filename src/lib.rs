#![warn(missing_docs)]

//! Tileset editing core for Macroquad: atlas tile spans, merge/split, Wang ids.

mod command;
mod config;
mod document;
mod editor;
mod error;
mod interaction;
mod loader {
    pub mod json_loader;
}
mod model;
mod render;
mod spatial;
mod tileset;
mod wang;

pub use command::{submit, EditOp, OpGroup, OperationLog};
pub use config::{ViewOptions, WrapBehavior, MAX_SCALE, MIN_SCALE};
pub use document::{DocumentChange, TilesetDocument};
pub use editor::{AtlasEditor, SplitEdge, MERGE_TILES, REMOVE_TILES, SPLIT_TILES};
pub use error::{EditError, TilesetError};
pub use interaction::{
    InteractionController, KeyCode, Modifiers, PointerButton, PointerEvent, WangBehavior,
    CHANGE_WANG_ID, RELOCATE_TILES,
};
pub use loader::json_loader::{load_tileset_from_file, load_tileset_from_str};
pub use model::{ModelEvent, SpanLayout, TileGrid, TilesetModel, FALLBACK_COLUMNS};
pub use render::{draw_tileset_view, GridGeometry, TilesetTextures};
pub use spatial::{
    atlas_to_view, coords_from_tile_id, grid_pos_from_pixel_rect, pixel_rect_from_grid,
    tile_id_from_atlas_coords, view_to_atlas, AtlasLayout, AtlasPos, Cell, GridRect, PixelRect,
    Span, SpanIndex, TileId,
};
pub use tileset::{Frame, Tile, Tileset, TilesetKind};
pub use wang::{WangId, WangIndex, WangSet, WangSetType};
