//! Wang (corner/edge terrain) ids attached to tiles.

use crate::spatial::TileId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Slot indices, clockwise from the top:
///   7|0|1
///   6|X|2
///   5|4|3
/// Even indices are edges, odd indices are corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum WangIndex {
    /// Edge slot, top.
    Top = 0,
    /// Corner slot, top right.
    TopRight = 1,
    /// Edge slot, right.
    Right = 2,
    /// Corner slot, bottom right.
    BottomRight = 3,
    /// Edge slot, bottom.
    Bottom = 4,
    /// Corner slot, bottom left.
    BottomLeft = 5,
    /// Edge slot, left.
    Left = 6,
    /// Corner slot, top left.
    TopLeft = 7,
}

impl WangIndex {
    /// Every slot in index order.
    pub const ALL: [WangIndex; 8] = [
        WangIndex::Top,
        WangIndex::TopRight,
        WangIndex::Right,
        WangIndex::BottomRight,
        WangIndex::Bottom,
        WangIndex::BottomLeft,
        WangIndex::Left,
        WangIndex::TopLeft,
    ];
}

/// Colour per slot; 0 means unassigned.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WangId {
    /// Colours indexed by [`WangIndex`].
    pub colors: [u8; 8],
}

impl WangId {
    /// Colour written into a hovered slot when no colour is active.
    pub const INDEX_MASK: u8 = 0xFF;

    /// No slot assigned.
    pub const EMPTY: WangId = WangId { colors: [0; 8] };

    /// Every slot set to `color`.
    pub fn filled(color: u8) -> Self {
        WangId { colors: [color; 8] }
    }

    /// Colour in one slot.
    #[inline]
    pub fn index_color(&self, index: WangIndex) -> u8 {
        self.colors[index as usize]
    }

    /// Sets the colour of one slot.
    #[inline]
    pub fn set_index_color(&mut self, index: WangIndex, color: u8) {
        self.colors[index as usize] = color;
    }

    /// Whether no slot is assigned.
    pub fn is_empty(&self) -> bool {
        self.colors.iter().all(|&c| c == 0)
    }

    /// Rotates clockwise by `rotations` quarter turns (negative turns
    /// counter-clockwise).
    pub fn rotate(&mut self, rotations: i32) {
        let shift = (rotations.rem_euclid(4) * 2) as usize;
        self.colors.rotate_right(shift);
    }

    /// Mirrors across the vertical axis.
    pub fn flip_horizontally(&mut self) {
        self.colors.swap(WangIndex::Right as usize, WangIndex::Left as usize);
        self.colors.swap(WangIndex::TopRight as usize, WangIndex::TopLeft as usize);
        self.colors.swap(WangIndex::BottomRight as usize, WangIndex::BottomLeft as usize);
    }

    /// Mirrors across the horizontal axis.
    pub fn flip_vertically(&mut self) {
        self.colors.swap(WangIndex::Top as usize, WangIndex::Bottom as usize);
        self.colors.swap(WangIndex::TopRight as usize, WangIndex::BottomRight as usize);
        self.colors.swap(WangIndex::TopLeft as usize, WangIndex::BottomLeft as usize);
    }

    /// Maps a 3x3 sub-cell of a tile to its slot. The centre has no slot.
    pub fn index_by_grid(x: i32, y: i32) -> Option<WangIndex> {
        match (x, y) {
            (0, 0) => Some(WangIndex::TopLeft),
            (1, 0) => Some(WangIndex::Top),
            (2, 0) => Some(WangIndex::TopRight),
            (0, 1) => Some(WangIndex::Left),
            (2, 1) => Some(WangIndex::Right),
            (0, 2) => Some(WangIndex::BottomLeft),
            (1, 2) => Some(WangIndex::Bottom),
            (2, 2) => Some(WangIndex::BottomRight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Which slots a Wang set paints.
#[serde(rename_all = "lowercase")]
pub enum WangSetType {
    /// Corners only.
    Corner,
    /// Edges only.
    Edge,
    /// Corners and edges.
    #[default]
    Mixed,
}

impl WangSetType {
    /// Resolves a pointer position, given as a fraction of the hovered tile
    /// (0..1 on each axis), to the slot it should paint. Returns `None` in
    /// the centre dead zone.
    pub fn hovered_index(self, fx: f32, fy: f32) -> Option<WangIndex> {
        let gx = ((fx * 3.0).floor() as i32).clamp(0, 2);
        let gy = ((fy * 3.0).floor() as i32).clamp(0, 2);
        let index = WangId::index_by_grid(gx, gy)?;

        Some(match self {
            WangSetType::Edge => {
                let (x, y) = (fx - 0.5, fy - 0.5);
                if x < y {
                    if x > -y {
                        WangIndex::Bottom
                    } else {
                        WangIndex::Left
                    }
                } else if x > -y {
                    WangIndex::Right
                } else {
                    WangIndex::Top
                }
            }
            WangSetType::Corner => match (fx > 0.5, fy > 0.5) {
                (true, true) => WangIndex::BottomRight,
                (true, false) => WangIndex::TopRight,
                (false, true) => WangIndex::BottomLeft,
                (false, false) => WangIndex::TopLeft,
            },
            WangSetType::Mixed => index,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Named terrain set mapping tiles to Wang ids.
pub struct WangSet {
    /// Display name.
    pub name: String,
    /// Which slots are painted.
    #[serde(default)]
    pub kind: WangSetType,
    /// Number of colours, excluding 0.
    #[serde(default)]
    pub color_count: u8,
    /// Non-empty ids by tile.
    #[serde(default)]
    pub wang_ids: HashMap<TileId, WangId>,
}

impl WangSet {
    /// Creates a set with no assigned tiles.
    pub fn new(name: impl Into<String>, kind: WangSetType, color_count: u8) -> Self {
        WangSet {
            name: name.into(),
            kind,
            color_count,
            wang_ids: HashMap::new(),
        }
    }

    /// Id assigned to `tile`, or [`WangId::EMPTY`].
    pub fn wang_id_of_tile(&self, tile: TileId) -> WangId {
        self.wang_ids.get(&tile).copied().unwrap_or_default()
    }

    /// Empty ids are removed rather than stored.
    pub fn set_wang_id(&mut self, tile: TileId, wang_id: WangId) {
        if wang_id.is_empty() {
            self.wang_ids.remove(&tile);
        } else {
            self.wang_ids.insert(tile, wang_id);
        }
    }

    /// Whether any tile carries `wang_id`.
    pub fn wang_id_is_used(&self, wang_id: WangId) -> bool {
        self.wang_ids.values().any(|&id| id == wang_id)
    }
}
