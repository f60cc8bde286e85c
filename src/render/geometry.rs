use crate::config::ViewOptions;
use crate::interaction::{PointerButton, PointerEvent};
use crate::model::{TileGrid, TilesetModel};
use crate::spatial::Cell;
use macroquad::prelude::*;

/// Cell size used for tilesets that declare no tile size.
const FALLBACK_CELL: i32 = 32;

/// Screen placement of a tileset view's cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// Screen position of cell (0, 0).
    pub origin: Vec2,
    /// Cell pitch on screen, grid line included.
    pub cell_size: Vec2,
    /// Width of the grid line.
    pub grid_space: f32,
    /// View columns.
    pub columns: i32,
    /// View rows.
    pub rows: i32,
}

impl GridGeometry {
    /// Geometry of `model`'s grid drawn from `origin` with `options`.
    pub fn new(origin: Vec2, options: &ViewOptions, model: &TilesetModel) -> Self {
        let tileset = model.tileset();
        let tile_w = if tileset.tile_width > 0 { tileset.tile_width } else { FALLBACK_CELL };
        let tile_h = if tileset.tile_height > 0 { tileset.tile_height } else { FALLBACK_CELL };
        let (w, h) = options.cell_size(tile_w, tile_h);
        GridGeometry {
            origin,
            cell_size: vec2(w, h),
            grid_space: options.grid_space() as f32,
            columns: model.column_count(),
            rows: model.row_count(),
        }
    }

    /// Size of the whole grid on screen.
    pub fn content_size(&self) -> Vec2 {
        vec2(
            self.columns.max(0) as f32 * self.cell_size.x,
            self.rows.max(0) as f32 * self.cell_size.y,
        )
    }

    /// Screen rectangle of `cell`, grid line excluded.
    pub fn cell_rect(&self, cell: Cell) -> Rect {
        self.span_rect(cell, 1, 1)
    }

    /// Screen rectangle of a `cols` x `rows` span starting at `cell`.
    pub fn span_rect(&self, cell: Cell, cols: i32, rows: i32) -> Rect {
        Rect::new(
            self.origin.x + cell.col as f32 * self.cell_size.x,
            self.origin.y + cell.row as f32 * self.cell_size.y,
            cols as f32 * self.cell_size.x - self.grid_space,
            rows as f32 * self.cell_size.y - self.grid_space,
        )
    }

    /// The in-bounds cell under `point`.
    pub fn cell_at(&self, point: Vec2) -> Option<Cell> {
        let local = point - self.origin;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let col = (local.x / self.cell_size.x) as i32;
        let row = (local.y / self.cell_size.y) as i32;
        (col < self.columns && row < self.rows).then_some(Cell::new(row, col))
    }

    /// Position of `point` inside `cell`, as a fraction of the tile.
    pub fn local_fraction(&self, cell: Cell, point: Vec2) -> (f32, f32) {
        let rect = self.cell_rect(cell);
        let fx = if rect.w > 0.0 { (point.x - rect.x) / rect.w } else { 0.0 };
        let fy = if rect.h > 0.0 { (point.y - rect.y) / rect.h } else { 0.0 };
        (fx.clamp(0.0, 1.0), fy.clamp(0.0, 1.0))
    }

    /// Resolves a screen point into a [`PointerEvent`].
    pub fn pointer_event(&self, point: Vec2, button: Option<PointerButton>) -> PointerEvent {
        match self.cell_at(point) {
            Some(cell) => {
                let (fx, fy) = self.local_fraction(cell, point);
                PointerEvent {
                    cell: Some(cell),
                    local: (fx, fy),
                    button,
                }
            }
            None => PointerEvent {
                button,
                ..PointerEvent::outside()
            },
        }
    }

    /// Cells intersecting the screen rectangle `view_min..view_max`, row by
    /// row, clamped to the grid.
    pub fn visible_cells(&self, view_min: Vec2, view_max: Vec2) -> Vec<Cell> {
        if self.columns <= 0 || self.rows <= 0 {
            return Vec::new();
        }
        let to_cell = |p: Vec2| {
            let local = p - self.origin;
            (
                (local.x / self.cell_size.x).floor() as i32,
                (local.y / self.cell_size.y).floor() as i32,
            )
        };
        let (mut c_min, mut r_min) = to_cell(view_min);
        let (mut c_max, mut r_max) = to_cell(view_max);
        if c_min > c_max {
            std::mem::swap(&mut c_min, &mut c_max);
        }
        if r_min > r_max {
            std::mem::swap(&mut r_min, &mut r_max);
        }

        let (c_min, c_max) = (c_min.max(0), c_max.min(self.columns - 1));
        let (r_min, r_max) = (r_min.max(0), r_max.min(self.rows - 1));
        let mut cells = Vec::new();
        for row in r_min..=r_max {
            for col in c_min..=c_max {
                cells.push(Cell::new(row, col));
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WrapBehavior;
    use crate::tileset::{Tileset, TilesetKind};

    fn geometry(options: ViewOptions) -> GridGeometry {
        let mut ts = Tileset::new("atlas", TilesetKind::Atlas, 16, 16).with_grid(4, 3);
        ts.fill_unit_tiles();
        GridGeometry::new(vec2(10.0, 20.0), &options, &TilesetModel::new(&ts))
    }

    #[test]
    fn cell_and_span_rects() {
        let g = geometry(ViewOptions::default());
        assert_eq!(g.cell_size, vec2(17.0, 17.0));
        assert_eq!(g.cell_rect(Cell::new(1, 2)), Rect::new(10.0 + 34.0, 20.0 + 17.0, 16.0, 16.0));
        assert_eq!(g.span_rect(Cell::new(0, 0), 2, 1), Rect::new(10.0, 20.0, 33.0, 16.0));
        assert_eq!(g.content_size(), vec2(68.0, 51.0));
    }

    #[test]
    fn hit_testing_stays_in_bounds() {
        let g = geometry(ViewOptions { draw_grid: false, scale: 2.0, ..ViewOptions::default() });
        assert_eq!(g.cell_at(vec2(10.0, 20.0)), Some(Cell::new(0, 0)));
        assert_eq!(g.cell_at(vec2(10.0 + 65.0, 20.0 + 33.0)), Some(Cell::new(1, 2)));
        assert_eq!(g.cell_at(vec2(9.0, 25.0)), None);
        assert_eq!(g.cell_at(vec2(10.0 + 128.0, 25.0)), None);

        let event = g.pointer_event(vec2(10.0 + 24.0, 20.0 + 8.0), Some(PointerButton::Left));
        assert_eq!(event.cell, Some(Cell::new(0, 0)));
        assert_eq!(event.local, (0.75, 0.25));
        assert_eq!(g.pointer_event(vec2(0.0, 0.0), None).cell, None);
    }

    #[test]
    fn visible_cells_are_clamped_and_ordered() {
        let g = geometry(ViewOptions { draw_grid: false, wrap: WrapBehavior::Fixed, ..ViewOptions::default() });
        let cells = g.visible_cells(vec2(30.0, 40.0), vec2(0.0, 0.0));
        assert_eq!(
            cells,
            vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 0), Cell::new(1, 1)]
        );
        assert_eq!(g.visible_cells(vec2(-100.0, -100.0), vec2(1000.0, 1000.0)).len(), 12);
        assert!(g.visible_cells(vec2(500.0, 500.0), vec2(600.0, 600.0)).is_empty());
    }
}
