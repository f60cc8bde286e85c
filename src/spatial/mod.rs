mod grid;
mod index;

pub use grid::*;
pub use index::{Span, SpanIndex};
