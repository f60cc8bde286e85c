use crate::spatial::{PixelRect, TileId};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Why an edit operation was rejected by a tileset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A tile with this id already exists.
    DuplicateTile(TileId),
    /// No tile with this id exists.
    UnknownTile(TileId),
    /// The tileset has no Wang set at this index.
    UnknownWangSet(usize),
    /// An atlas tile rectangle does not sit on the tile grid.
    UnalignedRect {
        /// The tile being added or resized.
        tile: TileId,
        /// The rejected rectangle.
        rect: PixelRect,
    },
    /// A relocation does not describe a permutation of the current tile order.
    OrderMismatch,
    /// `push`/`end_group` was called without an open group.
    NoOpenGroup,
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::DuplicateTile(id) => write!(f, "Tile {} already exists", id.0),
            EditError::UnknownTile(id) => write!(f, "Tile {} does not exist", id.0),
            EditError::UnknownWangSet(index) => write!(f, "No Wang set at index {}", index),
            EditError::UnalignedRect { tile, rect } => write!(
                f,
                "Image rect {}x{}+{}+{} of tile {} is not grid-aligned",
                rect.width, rect.height, rect.x, rect.y, tile.0
            ),
            EditError::OrderMismatch => write!(f, "Tile order does not match the tileset"),
            EditError::NoOpenGroup => write!(f, "No operation group is open"),
        }
    }
}

impl std::error::Error for EditError {}

/// Errors from loading tilesets and view options.
#[derive(Debug)]
pub enum TilesetError {
    /// File I/O error
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// JSON parse error
    Json {
        /// File being parsed, or `<inline>` for strings.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// The document parsed but describes an unusable tileset
    InvalidTileset(String),
    /// Unsupported file format (non-JSON)
    UnsupportedFormat(String),
}

impl fmt::Display for TilesetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TilesetError::Io { path, source } => {
                write!(f, "I/O error reading {}: {}", path.display(), source)
            }
            TilesetError::Json { path, source } => {
                write!(f, "Failed to parse JSON in {}: {}", path.display(), source)
            }
            TilesetError::InvalidTileset(msg) => write!(f, "Invalid tileset: {}", msg),
            TilesetError::UnsupportedFormat(ext) => write!(f, "Unsupported file format: {}", ext),
        }
    }
}

impl std::error::Error for TilesetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TilesetError::Io { source, .. } => Some(source),
            TilesetError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TilesetError {
    fn from(err: serde_json::Error) -> Self {
        TilesetError::Json {
            path: PathBuf::from("<inline>"),
            source: err,
        }
    }
}
