//! Pointer and keyboard handling for a tileset view.
//!
//! The controller owns only input state (selection, hover, Wang stroke).
//! Geometry comes from a [`TilesetModel`] and edits go to an
//! [`OperationLog`], both passed into each event.

use crate::command::{submit, EditOp, OpGroup, OperationLog};
use crate::editor::AtlasEditor;
use crate::error::EditError;
use crate::model::{TileGrid, TilesetModel};
use crate::spatial::{Cell, TileId};
use crate::wang::{WangId, WangIndex, WangSetType};
use std::collections::HashMap;

/// Undo text for Wang strokes.
pub const CHANGE_WANG_ID: &str = "Change Wang Id";
/// Undo text for tile moves.
pub const RELOCATE_TILES: &str = "Relocate Tiles";

/// Mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel button.
    Middle,
}

/// A pointer event already resolved to a view cell. `local` is the position
/// inside that cell as a fraction of its size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Cell under the pointer, `None` outside the grid.
    pub cell: Option<Cell>,
    /// Position inside the cell, 0..1 on each axis.
    pub local: (f32, f32),
    /// Pressed or released button; for moves, the button held down.
    pub button: Option<PointerButton>,
}

impl PointerEvent {
    /// Event at the centre of `cell` with no button.
    pub fn at(cell: Cell) -> Self {
        PointerEvent {
            cell: Some(cell),
            local: (0.5, 0.5),
            button: None,
        }
    }

    /// Event outside the grid.
    pub fn outside() -> Self {
        PointerEvent {
            cell: None,
            local: (0.0, 0.0),
            button: None,
        }
    }

    /// Sets the button.
    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = Some(button);
        self
    }

    /// Sets the position inside the cell.
    pub fn with_local(mut self, x: f32, y: f32) -> Self {
        self.local = (x, y);
        self
    }
}

/// Keys the view reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    /// Rotates the Wang brush; shift turns it the other way.
    Z,
    /// Flips the Wang brush horizontally.
    X,
    /// Flips the Wang brush vertically.
    Y,
    /// Left to the host.
    Space,
    /// Anything else.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Held modifier keys.
pub struct Modifiers {
    /// Either shift key.
    pub shift: bool,
    /// Control, or command on macOS.
    pub ctrl: bool,
}

/// What a Wang stroke writes into hovered tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WangBehavior {
    /// Replace the tile's id with the current [`WangId`].
    #[default]
    AssignWholeId,
    /// Paint the current colour into the hovered slot only.
    AssignHoveredIndex,
}

/// Wang painting state. `pending` remembers what this stroke already wrote,
/// so repeated passes over one tile compare against the new value even if
/// the model has not been refreshed yet.
#[derive(Debug, Default)]
struct WangStroke {
    editing: bool,
    wang_set: Option<usize>,
    behavior: WangBehavior,
    wang_id: WangId,
    color: u8,
    hovered: Option<Cell>,
    open: bool,
    pending: HashMap<TileId, WangId>,
}

/// Translates pointer and key input into selection changes and edits.
#[derive(Debug, Default)]
pub struct InteractionController {
    selection: Vec<Cell>,
    anchor: Option<Cell>,
    current: Option<Cell>,
    relocating: bool,
    wang: WangStroke,
}

impl InteractionController {
    /// Controller with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected cells in row-major order.
    pub fn selection(&self) -> &[Cell] {
        &self.selection
    }

    /// Drops the selection and its anchor.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.anchor = None;
    }

    /// Starts a new selection at `cell`. Unselectable cells clear it.
    pub fn select(&mut self, model: &TilesetModel, cell: Cell) {
        self.clear_selection();
        self.current = Some(cell);
        if model.is_selectable(cell) {
            self.selection.push(cell);
            self.anchor = Some(cell);
        }
    }

    /// Extends the selection to the rectangle between the anchor and `cell`.
    pub fn extend_selection(&mut self, model: &TilesetModel, cell: Cell) {
        let Some(anchor) = self.anchor else {
            self.select(model, cell);
            return;
        };
        self.current = Some(cell);
        self.selection.clear();
        for row in anchor.row.min(cell.row)..=anchor.row.max(cell.row) {
            for col in anchor.col.min(cell.col)..=anchor.col.max(cell.col) {
                let candidate = Cell::new(row, col);
                if model.is_selectable(candidate) {
                    self.selection.push(candidate);
                }
            }
        }
    }

    /// Inclusive bounding rectangle of the selection.
    pub fn selection_bounds(&self) -> Option<(Cell, Cell)> {
        let first = self.selection.first()?;
        let (mut tl, mut br) = (*first, *first);
        for cell in &self.selection[1..] {
            tl = Cell::new(tl.row.min(cell.row), tl.col.min(cell.col));
            br = Cell::new(br.row.max(cell.row), br.col.max(cell.col));
        }
        Some((tl, br))
    }

    /// Tile under the most recently pressed cell.
    pub fn current_tile(&self, model: &TilesetModel) -> Option<TileId> {
        model.tile_at(self.current?).map(|tile| tile.id)
    }

    /// The two selected tiles, when exactly two cells holding tiles are
    /// selected.
    pub fn swap_request(&self, model: &TilesetModel) -> Option<(TileId, TileId)> {
        let [a, b] = self.selection.as_slice() else {
            return None;
        };
        let first = model.tile_at(*a)?;
        let second = model.tile_at(*b)?;
        Some((first.id, second.id))
    }

    /// Whether drags move tiles.
    pub fn is_relocating(&self) -> bool {
        self.relocating
    }

    /// Toggles relocation on the controller and `model`, clearing the selection.
    pub fn set_relocating(&mut self, model: &mut TilesetModel, enabled: bool) {
        if self.relocating == enabled {
            return;
        }
        self.relocating = enabled;
        model.set_relocating(enabled);
        self.clear_selection();
    }

    /// Whether clicks paint Wang ids.
    pub fn is_editing_wang_set(&self) -> bool {
        self.wang.editing
    }

    /// Enters or leaves Wang painting.
    pub fn set_edit_wang_set(&mut self, enabled: bool) {
        self.wang.editing = enabled;
        if !enabled {
            self.wang.hovered = None;
        }
    }

    /// Index of the Wang set being painted.
    pub fn wang_set(&self) -> Option<usize> {
        self.wang.wang_set
    }

    /// Selects the Wang set to paint.
    pub fn set_wang_set(&mut self, wang_set: Option<usize>) {
        self.wang.wang_set = wang_set;
    }

    /// Switches to whole-id painting with `wang_id`.
    pub fn set_wang_id(&mut self, wang_id: WangId) {
        self.wang.wang_id = wang_id;
        self.wang.behavior = WangBehavior::AssignWholeId;
    }

    /// Switches to per-slot painting with `color`; 0 erases.
    pub fn set_wang_color(&mut self, color: u8) {
        self.wang.color = color;
        self.wang.behavior = WangBehavior::AssignHoveredIndex;
    }

    /// Id written by whole-id painting.
    pub fn wang_id(&self) -> WangId {
        self.wang.wang_id
    }

    /// Current painting behavior.
    pub fn wang_behavior(&self) -> WangBehavior {
        self.wang.behavior
    }

    /// Cell highlighted while painting.
    pub fn hovered_cell(&self) -> Option<Cell> {
        self.wang.hovered
    }

    /// Handles a button press.
    pub fn pointer_pressed(
        &mut self,
        model: &TilesetModel,
        event: PointerEvent,
        log: &mut dyn OperationLog,
    ) -> Result<(), EditError> {
        if self.wang.editing {
            if event.button == Some(PointerButton::Left) {
                self.hover(model, event);
                self.apply_wang_id(model, log)?;
            }
            return Ok(());
        }

        let Some(cell) = event.cell else {
            self.clear_selection();
            return Ok(());
        };
        match event.button {
            Some(PointerButton::Left) => self.select(model, cell),
            Some(PointerButton::Right) if !self.selection.contains(&cell) => {
                self.select(model, cell)
            }
            _ => self.current = Some(cell),
        }
        Ok(())
    }

    /// Handles pointer motion, extending the selection or the Wang stroke.
    pub fn pointer_moved(
        &mut self,
        model: &TilesetModel,
        event: PointerEvent,
        log: &mut dyn OperationLog,
    ) -> Result<(), EditError> {
        if self.wang.editing {
            self.hover(model, event);
            if event.button == Some(PointerButton::Left) {
                self.apply_wang_id(model, log)?;
            }
            return Ok(());
        }

        if let (Some(PointerButton::Left), Some(cell)) = (event.button, event.cell) {
            self.extend_selection(model, cell);
        }
        Ok(())
    }

    /// Returns whether an edit was submitted.
    pub fn pointer_released(
        &mut self,
        model: &TilesetModel,
        event: PointerEvent,
        log: &mut dyn OperationLog,
    ) -> Result<bool, EditError> {
        if self.wang.editing {
            if event.button == Some(PointerButton::Left) {
                return self.finish_wang_change(log);
            }
            return Ok(false);
        }

        if self.relocating && model.tileset().is_atlas() {
            return self.release_on_atlas(model, event, log);
        }
        Ok(false)
    }

    /// Clears the hover highlight.
    pub fn pointer_left(&mut self) {
        self.wang.hovered = None;
    }

    fn release_on_atlas(
        &mut self,
        model: &TilesetModel,
        event: PointerEvent,
        log: &mut dyn OperationLog,
    ) -> Result<bool, EditError> {
        let Some((top_left, bottom_right)) = self.selection_bounds() else {
            return Ok(false);
        };
        let editor = AtlasEditor::new(model);

        let submitted = match event.button {
            Some(PointerButton::Left) => match model.atlas_rect(top_left, bottom_right) {
                Some(grid) => editor.apply_merge(
                    grid.row,
                    grid.row + grid.height - 1,
                    grid.col,
                    grid.col + grid.width - 1,
                    log,
                )?,
                None => {
                    log::debug!("Merge ignored while the view is wrapped");
                    false
                }
            },
            Some(PointerButton::Right) => {
                let cell = event.cell.unwrap_or(self.selection[0]);
                if let Some(span) = model.spanning_tile_covering(cell) {
                    match model.cell_for_tile(span.id).filter(|_| model.is_unwrapped()) {
                        Some(origin) => editor.apply_split(
                            span.id,
                            cell.row - origin.row,
                            cell.col - origin.col,
                            log,
                        )?,
                        None => {
                            log::debug!("Split ignored while the view is wrapped");
                            false
                        }
                    }
                } else if let Some(tile) = model.tile_at(cell) {
                    submit(editor.remove_tile(tile.id), log)?
                } else {
                    false
                }
            }
            _ => return Ok(false),
        };

        self.clear_selection();
        Ok(submitted)
    }

    /// Moves the selected tiles of a non-atlas tileset to `destination`.
    pub fn drop_selection(
        &mut self,
        model: &TilesetModel,
        destination: Cell,
        log: &mut dyn OperationLog,
    ) -> Result<bool, EditError> {
        if !self.relocating {
            return Ok(false);
        }
        let payload = model.drag_payload(&self.selection);
        let Some(op) = model.drop_tiles(&payload, destination) else {
            return Ok(false);
        };
        let mut group = OpGroup::new(RELOCATE_TILES);
        group.push(op);
        let submitted = submit(group, log)?;
        self.clear_selection();
        Ok(submitted)
    }

    fn wang_set_type(&self, model: &TilesetModel) -> Option<WangSetType> {
        let index = self.wang.wang_set?;
        model.tileset().wang_sets.get(index).map(|set| set.kind)
    }

    /// Tracks the hovered cell and, when painting single slots, rebuilds the
    /// pending id from the slot under the pointer.
    fn hover(&mut self, model: &TilesetModel, event: PointerEvent) {
        let Some(kind) = self.wang_set_type(model) else {
            return;
        };
        self.wang.hovered = event.cell;

        if self.wang.behavior == WangBehavior::AssignHoveredIndex {
            let mut wang_id = WangId::EMPTY;
            let (fx, fy) = event.local;
            if let Some(index) = kind.hovered_index(fx, fy) {
                let color = if self.wang.color != 0 {
                    self.wang.color
                } else {
                    WangId::INDEX_MASK
                };
                wang_id.set_index_color(index, color);
            }
            self.wang.wang_id = wang_id;
        }
    }

    fn apply_wang_id(&mut self, model: &TilesetModel, log: &mut dyn OperationLog) -> Result<(), EditError> {
        let (Some(cell), Some(set_index)) = (self.wang.hovered, self.wang.wang_set) else {
            return Ok(());
        };
        let Some(set) = model.tileset().wang_sets.get(set_index) else {
            return Ok(());
        };
        let Some(tile) = model.tile_at(cell) else {
            return Ok(());
        };

        let previous = self
            .wang
            .pending
            .get(&tile.id)
            .copied()
            .unwrap_or_else(|| set.wang_id_of_tile(tile.id));
        let mut next = previous;
        match self.wang.behavior {
            WangBehavior::AssignWholeId => next = self.wang.wang_id,
            WangBehavior::AssignHoveredIndex => {
                for index in WangIndex::ALL {
                    if self.wang.wang_id.index_color(index) != 0 {
                        next.set_index_color(index, self.wang.color);
                    }
                }
            }
        }
        if next == previous {
            return Ok(());
        }

        if !self.wang.open {
            log.begin_group(CHANGE_WANG_ID);
            self.wang.open = true;
        }
        let op = EditOp::ChangeWangId {
            wang_set: set_index,
            tile: tile.id,
            from: previous,
            to: next,
        };
        if let Err(err) = log.push(op) {
            log::warn!("{} rejected: {}; aborting stroke", CHANGE_WANG_ID, err);
            log.abort_group();
            self.wang.open = false;
            self.wang.pending.clear();
            return Err(err);
        }
        self.wang.pending.insert(tile.id, next);
        Ok(())
    }

    fn finish_wang_change(&mut self, log: &mut dyn OperationLog) -> Result<bool, EditError> {
        if !self.wang.open {
            return Ok(false);
        }
        self.wang.open = false;
        self.wang.pending.clear();
        log.end_group()?;
        Ok(true)
    }

    /// Transforms the whole-id brush. Returns `false` for keys left to the
    /// host, Space among them.
    pub fn key_pressed(&mut self, key: KeyCode, modifiers: Modifiers) -> bool {
        if !self.wang.editing
            || self.wang.behavior != WangBehavior::AssignWholeId
            || modifiers.ctrl
        {
            return false;
        }

        let mut transformed = self.wang.wang_id;
        match key {
            KeyCode::Z if modifiers.shift => transformed.rotate(-1),
            KeyCode::Z => transformed.rotate(1),
            KeyCode::X => transformed.flip_horizontally(),
            KeyCode::Y => transformed.flip_vertically(),
            KeyCode::Space | KeyCode::Other => return false,
        }
        if transformed == self.wang.wang_id {
            return false;
        }
        self.set_wang_id(transformed);
        true
    }
}
