//! In-memory host for a tileset: applies operations as they are pushed,
//! keeps committed groups on an undo stack and queues structural change
//! notifications for the model.

use crate::command::{EditOp, OpGroup, OperationLog};
use crate::error::EditError;
use crate::spatial::TileId;
use crate::tileset::Tileset;

/// Structural change notification, one per applied op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentChange {
    /// Tiles were added.
    TilesAdded(Vec<TileId>),
    /// Tiles were removed.
    TilesRemoved(Vec<TileId>),
    /// Tiles got new image rectangles.
    ImageRectsChanged(Vec<TileId>),
    /// The tile order changed.
    TilesRelocated,
    /// Tiles got new Wang ids.
    WangIdsChanged(Vec<TileId>),
}

impl DocumentChange {
    fn for_op(op: &EditOp) -> Self {
        match op {
            EditOp::AddTiles(_) => DocumentChange::TilesAdded(op.affected_tiles()),
            EditOp::RemoveTiles(_) => DocumentChange::TilesRemoved(op.affected_tiles()),
            EditOp::ChangeImageRect { .. } => {
                DocumentChange::ImageRectsChanged(op.affected_tiles())
            }
            EditOp::RelocateTiles { .. } => DocumentChange::TilesRelocated,
            EditOp::ChangeWangId { .. } => DocumentChange::WangIdsChanged(op.affected_tiles()),
        }
    }
}

/// Owns a tileset and its undo history.
pub struct TilesetDocument {
    tileset: Tileset,
    undo_stack: Vec<OpGroup>,
    redo_stack: Vec<OpGroup>,
    open: Option<OpGroup>,
    changes: Vec<DocumentChange>,
    max_undo: usize,
}

impl TilesetDocument {
    /// Undo steps kept unless configured otherwise.
    pub const DEFAULT_UNDO_LIMIT: usize = 256;

    /// A document with empty history.
    pub fn new(tileset: Tileset) -> Self {
        TilesetDocument {
            tileset,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            open: None,
            changes: Vec::new(),
            max_undo: Self::DEFAULT_UNDO_LIMIT,
        }
    }

    /// Keeps at most `max_undo` undo steps.
    pub fn with_undo_limit(mut self, max_undo: usize) -> Self {
        self.max_undo = max_undo.max(1);
        self
    }

    /// Current state.
    pub fn tileset(&self) -> &Tileset {
        &self.tileset
    }

    /// True when a committed group can be undone.
    pub fn can_undo(&self) -> bool {
        self.open.is_none() && !self.undo_stack.is_empty()
    }

    /// True when an undone group can be redone.
    pub fn can_redo(&self) -> bool {
        self.open.is_none() && !self.redo_stack.is_empty()
    }

    /// Name of the group `undo` would revert.
    pub fn undo_text(&self) -> Option<&str> {
        self.undo_stack.last().map(|g| g.name.as_str())
    }

    /// Structural changes since the last call, in application order.
    pub fn take_changes(&mut self) -> Vec<DocumentChange> {
        std::mem::take(&mut self.changes)
    }

    fn apply(&mut self, op: &EditOp) -> Result<(), EditError> {
        self.tileset.apply(op)?;
        self.changes.push(DocumentChange::for_op(op));
        Ok(())
    }

    /// Reverts ops in reverse order. The ops were applied successfully, so
    /// their inverses cannot fail unless the tileset was modified behind
    /// our back.
    fn revert(&mut self, ops: &[EditOp]) {
        for op in ops.iter().rev() {
            if let Err(err) = self.apply(&op.inverted()) {
                log::warn!("Failed to revert {:?}: {}", op, err);
                debug_assert!(false, "revert of an applied op failed: {err}");
            }
        }
    }

    /// Reverts the last committed group. Refused while a group is open.
    pub fn undo(&mut self) -> bool {
        if self.open.is_some() {
            return false;
        }
        let Some(group) = self.undo_stack.pop() else {
            return false;
        };
        log::debug!("Undo {}", group.name);
        self.revert(&group.ops);
        self.redo_stack.push(group);
        true
    }

    /// Reapplies the last undone group. Refused while a group is open.
    pub fn redo(&mut self) -> bool {
        if self.open.is_some() {
            return false;
        }
        let Some(group) = self.redo_stack.pop() else {
            return false;
        };
        log::debug!("Redo {}", group.name);
        for (applied, op) in group.ops.iter().enumerate() {
            if let Err(err) = self.apply(op) {
                log::warn!("Failed to redo {}: {}", group.name, err);
                self.revert(&group.ops[..applied]);
                return false;
            }
        }
        self.undo_stack.push(group);
        true
    }
}

impl OperationLog for TilesetDocument {
    fn begin_group(&mut self, name: &str) {
        if let Some(open) = &self.open {
            log::warn!("Group '{}' still open when beginning '{}'", open.name, name);
            let _ = self.end_group();
        }
        self.open = Some(OpGroup::new(name));
    }

    fn push(&mut self, op: EditOp) -> Result<(), EditError> {
        if self.open.is_none() {
            return Err(EditError::NoOpenGroup);
        }
        self.apply(&op)?;
        if let Some(open) = self.open.as_mut() {
            open.push(op);
        }
        Ok(())
    }

    fn end_group(&mut self) -> Result<(), EditError> {
        let group = self.open.take().ok_or(EditError::NoOpenGroup)?;
        if group.is_empty() {
            return Ok(());
        }
        self.redo_stack.clear();
        self.undo_stack.push(group);
        if self.undo_stack.len() > self.max_undo {
            let excess = self.undo_stack.len() - self.max_undo;
            self.undo_stack.drain(..excess);
        }
        Ok(())
    }

    fn abort_group(&mut self) {
        if let Some(group) = self.open.take() {
            log::debug!("Aborting {} ({} ops)", group.name, group.len());
            self.revert(&group.ops);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::submit;
    use crate::spatial::PixelRect;
    use crate::tileset::{Tile, TilesetKind};

    fn document() -> TilesetDocument {
        let mut ts = Tileset::new("atlas", TilesetKind::Atlas, 16, 16).with_grid(3, 3);
        ts.fill_unit_tiles();
        TilesetDocument::new(ts)
    }

    fn grow(tile: u32) -> EditOp {
        EditOp::ChangeImageRect {
            tile: TileId(tile),
            from: PixelRect::new(0, 0, 16, 16),
            to: PixelRect::new(0, 0, 32, 16),
        }
    }

    #[test]
    fn undo_and_redo_round_trip() {
        let mut doc = document();
        let original = doc.tileset().clone();

        let mut group = OpGroup::new("Merge Tiles");
        group.push(EditOp::RemoveTiles(vec![doc.tileset().find_tile(TileId(1)).unwrap().clone()]));
        group.push(grow(0));
        assert_eq!(submit(group, &mut doc), Ok(true));
        let merged = doc.tileset().clone();
        assert_eq!(doc.undo_text(), Some("Merge Tiles"));

        assert!(doc.undo());
        assert_eq!(doc.tileset().tile_count(), original.tile_count());
        assert_eq!(doc.tileset().find_tile(TileId(0)), original.find_tile(TileId(0)));
        assert!(doc.tileset().find_tile(TileId(1)).is_some());

        assert!(doc.redo());
        assert_eq!(doc.tileset(), &merged);
        assert!(!doc.can_redo());
    }

    #[test]
    fn aborted_group_leaves_no_trace() {
        let mut doc = document();
        let original = doc.tileset().clone();

        let mut group = OpGroup::new("Split Tiles");
        group.push(grow(0));
        group.push(EditOp::AddTiles(vec![Tile::new(TileId(0), PixelRect::new(0, 0, 16, 16))]));
        assert_eq!(submit(group, &mut doc), Err(EditError::DuplicateTile(TileId(0))));

        assert_eq!(doc.tileset(), &original);
        assert!(!doc.can_undo());
    }

    #[test]
    fn push_outside_group_is_rejected() {
        let mut doc = document();
        assert_eq!(doc.push(grow(0)), Err(EditError::NoOpenGroup));
        assert!(doc.take_changes().is_empty());
    }

    #[test]
    fn changes_are_queued_per_op() {
        let mut doc = document();
        let mut group = OpGroup::new("Resize");
        group.push(grow(0));
        submit(group, &mut doc).unwrap();
        assert_eq!(doc.take_changes(), vec![DocumentChange::ImageRectsChanged(vec![TileId(0)])]);
        assert!(doc.take_changes().is_empty());
    }

    #[test]
    fn undo_limit_drops_oldest_groups() {
        let mut doc = document().with_undo_limit(1);
        for _ in 0..2 {
            let mut group = OpGroup::new("Resize");
            let rect = doc.tileset().find_tile(TileId(0)).unwrap().image_rect;
            let to = if rect.width == 16 { PixelRect::new(0, 0, 32, 16) } else { PixelRect::new(0, 0, 16, 16) };
            group.push(EditOp::ChangeImageRect { tile: TileId(0), from: rect, to });
            submit(group, &mut doc).unwrap();
        }
        assert!(doc.undo());
        assert!(!doc.undo());
    }
}
