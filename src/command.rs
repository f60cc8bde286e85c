use crate::error::EditError;
use crate::spatial::{PixelRect, TileId};
use crate::tileset::Tile;
use crate::wang::WangId;

/// One undoable edit of a tileset. Every variant carries enough state to
/// build its own inverse.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    /// Tiles appended to the tileset.
    AddTiles(Vec<Tile>),
    /// Full snapshots of the removed tiles.
    RemoveTiles(Vec<Tile>),
    /// New image rectangle for one tile.
    ChangeImageRect {
        /// The resized tile.
        tile: TileId,
        /// Rectangle before the change.
        from: PixelRect,
        /// Rectangle after the change.
        to: PixelRect,
    },
    /// Tile order before and after the move.
    RelocateTiles {
        /// Order before the move.
        before: Vec<TileId>,
        /// Order after the move.
        after: Vec<TileId>,
    },
    /// New Wang id for one tile in one Wang set.
    ChangeWangId {
        /// Index into the tileset's Wang sets.
        wang_set: usize,
        /// The painted tile.
        tile: TileId,
        /// Id before the change.
        from: WangId,
        /// Id after the change.
        to: WangId,
    },
}

impl EditOp {
    /// The op that exactly undoes this one.
    pub fn inverted(&self) -> EditOp {
        match self {
            EditOp::AddTiles(tiles) => EditOp::RemoveTiles(tiles.clone()),
            EditOp::RemoveTiles(tiles) => EditOp::AddTiles(tiles.clone()),
            EditOp::ChangeImageRect { tile, from, to } => EditOp::ChangeImageRect {
                tile: *tile,
                from: *to,
                to: *from,
            },
            EditOp::RelocateTiles { before, after } => EditOp::RelocateTiles {
                before: after.clone(),
                after: before.clone(),
            },
            EditOp::ChangeWangId {
                wang_set,
                tile,
                from,
                to,
            } => EditOp::ChangeWangId {
                wang_set: *wang_set,
                tile: *tile,
                from: *to,
                to: *from,
            },
        }
    }

    /// Tiles whose state this op touches.
    pub fn affected_tiles(&self) -> Vec<TileId> {
        match self {
            EditOp::AddTiles(tiles) | EditOp::RemoveTiles(tiles) => {
                tiles.iter().map(|t| t.id).collect()
            }
            EditOp::ChangeImageRect { tile, .. } | EditOp::ChangeWangId { tile, .. } => {
                vec![*tile]
            }
            EditOp::RelocateTiles { after, .. } => after.clone(),
        }
    }
}

/// An atomic bundle of operations, undone and redone as one step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpGroup {
    /// Undo text shown to the user.
    pub name: String,
    /// Ops in application order.
    pub ops: Vec<EditOp>,
}

impl OpGroup {
    /// An empty group.
    pub fn new(name: impl Into<String>) -> Self {
        OpGroup {
            name: name.into(),
            ops: Vec::new(),
        }
    }

    /// Appends `op`.
    pub fn push(&mut self, op: EditOp) {
        self.ops.push(op);
    }

    /// True when the group holds no ops.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of ops.
    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// The append-only, group-capable log edits are submitted to. Undo and redo
/// belong to the implementation.
pub trait OperationLog {
    /// Opens a group named `name`.
    fn begin_group(&mut self, name: &str);
    /// Applies `op` and records it in the open group.
    fn push(&mut self, op: EditOp) -> Result<(), EditError>;
    /// Commits the open group as one undo step.
    fn end_group(&mut self) -> Result<(), EditError>;
    /// Drops everything pushed since `begin_group`.
    fn abort_group(&mut self);
}

/// Pushes `group` as one unit. Returns `Ok(false)` for an empty group, which
/// is never submitted. On the first rejected op the group is aborted.
pub fn submit(group: OpGroup, log: &mut dyn OperationLog) -> Result<bool, EditError> {
    if group.is_empty() {
        return Ok(false);
    }

    log.begin_group(&group.name);
    for op in group.ops {
        if let Err(err) = log.push(op) {
            log::warn!("{} rejected: {}; aborting group", group.name, err);
            log.abort_group();
            return Err(err);
        }
    }
    log.end_group()?;
    Ok(true)
}
