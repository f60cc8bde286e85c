use crate::tileset::{Tile, Tileset};
use anyhow::Context;
use macroquad::prelude::*;
use std::collections::HashMap;
use std::path::Path;

/// Textures for a tileset: the shared image for grid and atlas tilesets,
/// one image per tile for collections.
#[derive(Default)]
pub struct TilesetTextures {
    shared: Option<Texture2D>,
    per_tile: HashMap<String, Texture2D>,
}

async fn load_nearest(base_dir: &Path, image: &str) -> anyhow::Result<Texture2D> {
    let path = base_dir.join(image);
    let path_str = path
        .to_str()
        .with_context(|| format!("Non UTF-8 image path {}", path.display()))?;
    let tex = load_texture(path_str)
        .await
        .with_context(|| format!("Loading texture {}", image))?;
    tex.set_filter(FilterMode::Nearest);
    Ok(tex)
}

impl TilesetTextures {
    /// Loads every image the tileset refers to, relative to `base_dir`.
    pub async fn load(tileset: &Tileset, base_dir: &Path) -> anyhow::Result<Self> {
        let mut textures = TilesetTextures::default();
        if let Some(image) = &tileset.image {
            textures.shared = Some(load_nearest(base_dir, image).await?);
        }
        for tile in tileset.tiles() {
            let Some(image) = &tile.image_source else {
                continue;
            };
            if textures.per_tile.contains_key(image) {
                continue;
            }
            let tex = load_nearest(base_dir, image).await?;
            textures.per_tile.insert(image.clone(), tex);
        }
        Ok(textures)
    }

    /// The texture `tile` is cut from.
    pub fn texture_for(&self, tile: &Tile) -> Option<&Texture2D> {
        match &tile.image_source {
            Some(image) => self.per_tile.get(image),
            None => self.shared.as_ref(),
        }
    }
}
