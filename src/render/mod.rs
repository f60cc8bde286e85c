//! Macroquad binding for the tileset view. The rest of the crate does not
//! depend on anything in here.

mod draw;
mod geometry;
mod textures;

pub use draw::draw_tileset_view;
pub use geometry::GridGeometry;
pub use textures::TilesetTextures;
