use super::{GridGeometry, TilesetTextures};
use crate::config::ViewOptions;
use crate::interaction::InteractionController;
use crate::model::{TileGrid, TilesetModel};
use crate::spatial::Cell;
use crate::tileset::Tile;
use crate::wang::{WangId, WangIndex};
use macroquad::prelude::*;

const GRID_COLOR: Color = Color::new(0.5, 0.5, 0.5, 0.6);
const SELECTION_COLOR: Color = Color::new(0.2, 0.5, 1.0, 0.35);
const HOVER_COLOR: Color = Color::new(1.0, 1.0, 1.0, 0.25);
const EMPTY_SLOT_COLOR: Color = Color::new(0.0, 0.0, 0.0, 0.45);
const ANIMATED_MARK_COLOR: Color = Color::new(1.0, 0.6, 0.0, 0.9);

/// Colours for Wang colour indices 1.., wrapping around.
const WANG_PALETTE: [Color; 6] = [RED, GREEN, BLUE, YELLOW, MAGENTA, SKYBLUE];

fn wang_color(index: u8) -> Color {
    if index == WangId::INDEX_MASK {
        return WHITE;
    }
    let mut c = WANG_PALETTE[(index.max(1) as usize - 1) % WANG_PALETTE.len()];
    c.a = 0.6;
    c
}

/// 3x3 sub-cell of each Wang slot, as (x, y).
fn slot_grid(index: WangIndex) -> (f32, f32) {
    match index {
        WangIndex::TopLeft => (0.0, 0.0),
        WangIndex::Top => (1.0, 0.0),
        WangIndex::TopRight => (2.0, 0.0),
        WangIndex::Left => (0.0, 1.0),
        WangIndex::Right => (2.0, 1.0),
        WangIndex::BottomLeft => (0.0, 2.0),
        WangIndex::Bottom => (1.0, 2.0),
        WangIndex::BottomRight => (2.0, 2.0),
    }
}

fn draw_tile(tile: &Tile, dest: Rect, textures: &TilesetTextures) {
    let Some(tex) = textures.texture_for(tile) else {
        draw_rectangle_lines(dest.x, dest.y, dest.w, dest.h, 1.0, RED);
        return;
    };
    let src = tile.image_rect;
    draw_texture_ex(
        tex,
        dest.x,
        dest.y,
        WHITE,
        DrawTextureParams {
            source: Some(Rect::new(src.x as f32, src.y as f32, src.width as f32, src.height as f32)),
            dest_size: Some(vec2(dest.w, dest.h)),
            ..Default::default()
        },
    );
}

fn draw_wang_id(wang_id: WangId, rect: Rect) {
    let (w, h) = (rect.w / 3.0, rect.h / 3.0);
    for index in WangIndex::ALL {
        let color = wang_id.index_color(index);
        if color == 0 {
            continue;
        }
        let (gx, gy) = slot_grid(index);
        draw_rectangle(rect.x + gx * w, rect.y + gy * h, w, h, wang_color(color));
    }
}

/// Draws the part of the view between `view_min` and `view_max`.
pub fn draw_tileset_view(
    model: &TilesetModel,
    geometry: &GridGeometry,
    options: &ViewOptions,
    textures: &TilesetTextures,
    controller: &InteractionController,
    view_min: Vec2,
    view_max: Vec2,
) {
    let cells = geometry.visible_cells(view_min, view_max);
    let is_atlas = model.tileset().is_atlas();

    for &cell in &cells {
        let rect = geometry.cell_rect(cell);
        match model.tile_at(cell) {
            Some(tile) if model.span_size_at(cell) == (1, 1) => {
                draw_tile(tile, rect, textures);
                if options.mark_animated_tiles && tile.is_animated() {
                    draw_triangle(
                        vec2(rect.x + rect.w, rect.y),
                        vec2(rect.x + rect.w - rect.w / 4.0, rect.y),
                        vec2(rect.x + rect.w, rect.y + rect.h / 4.0),
                        ANIMATED_MARK_COLOR,
                    );
                }
            }
            Some(_) => {}
            None => {
                if is_atlas && controller.is_relocating() && model.spanning_tile_covering(cell).is_none() {
                    draw_rectangle(rect.x, rect.y, rect.w, rect.h, EMPTY_SLOT_COLOR);
                }
            }
        }
    }

    // Spans are drawn whole from their origin, even when it is scrolled out.
    let view = Rect::new(
        view_min.x.min(view_max.x),
        view_min.y.min(view_max.y),
        (view_max.x - view_min.x).abs(),
        (view_max.y - view_min.y).abs(),
    );
    for span in model.span_layout() {
        let rect = geometry.span_rect(span.origin, span.cols, span.rows);
        if !rect.overlaps(&view) {
            continue;
        }
        if let Some(tile) = model.find_tile(span.tile) {
            draw_tile(tile, rect, textures);
        }
    }

    if options.draw_grid {
        for &cell in &cells {
            let r = geometry.cell_rect(cell);
            draw_rectangle_lines(r.x, r.y, r.w + geometry.grid_space, r.h + geometry.grid_space, 1.0, GRID_COLOR);
        }
    }

    for &cell in controller.selection() {
        let (cols, rows) = model.span_size_at(cell);
        let r = geometry.span_rect(cell, cols, rows);
        draw_rectangle(r.x, r.y, r.w, r.h, SELECTION_COLOR);
    }

    if controller.is_editing_wang_set() {
        draw_wang_overlay(model, geometry, controller, &cells);
    }
}

fn draw_wang_overlay(
    model: &TilesetModel,
    geometry: &GridGeometry,
    controller: &InteractionController,
    cells: &[Cell],
) {
    let wang_sets = &model.tileset().wang_sets;
    let Some(set) = controller.wang_set().and_then(|i| wang_sets.get(i)) else {
        return;
    };
    for &cell in cells {
        if let Some(tile) = model.tile_at(cell) {
            draw_wang_id(set.wang_id_of_tile(tile.id), geometry.cell_rect(cell));
        }
    }
    if let Some(hovered) = controller.hovered_cell() {
        let r = geometry.cell_rect(hovered);
        draw_rectangle(r.x, r.y, r.w, r.h, HOVER_COLOR);
        draw_wang_id(controller.wang_id(), r);
    }
}
