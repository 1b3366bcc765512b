//! Viewer configuration.
//!
//! Built from the command line in `main`; the defaults reproduce the stock
//! scene (a 256x256 numeric heightmap with a water layer on a 16000 unit plane).

use crate::scene::LayerKind;
use crate::terrain::loader::NUMERIC_HEIGHT_SCALE;
use crate::terrain::{HeightFormat, Source};

pub const DEFAULT_HEIGHTS: &str = "assets/5000000000.hght.json";
pub const DEFAULT_TEXTURE: &str = "assets/map-texture.png";
pub const DEFAULT_WATER_HEIGHTS: &str = "assets/5000000000.water.extm.json";
pub const DEFAULT_WATER_TEXTURE: &str = "assets/5000000000.water.tex.png";

/// Plane extent in world units, both axes.
pub const DEFAULT_SIZE: f32 = 16000.0;

/// Sources for one terrain surface.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerConfig {
    pub kind: LayerKind,
    pub heights: Source,
    pub texture: Option<Source>,
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub ground: LayerConfig,
    pub water: Option<LayerConfig>,
    /// Forced heightmap format; detected from the extension when `None`
    pub format: Option<HeightFormat>,
    pub numeric_scale: f32,
    pub image_scale: f32,
    /// Grid segments `(x, z)`; derived from the heightmap when `None`
    pub segments: Option<(usize, usize)>,
    pub size: f32,
    pub auto_forward: bool,
}

impl ViewerConfig {
    /// Layers in load order.
    pub fn layers(&self) -> Vec<LayerConfig> {
        std::iter::once(self.ground.clone())
            .chain(self.water.clone())
            .collect()
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            ground: LayerConfig {
                kind: LayerKind::Ground,
                heights: Source::parse(DEFAULT_HEIGHTS),
                texture: Some(Source::parse(DEFAULT_TEXTURE)),
            },
            water: Some(LayerConfig {
                kind: LayerKind::Water,
                heights: Source::parse(DEFAULT_WATER_HEIGHTS),
                texture: Some(Source::parse(DEFAULT_WATER_TEXTURE)),
            }),
            format: None,
            numeric_scale: NUMERIC_HEIGHT_SCALE,
            image_scale: 1.0,
            segments: None,
            size: DEFAULT_SIZE,
            auto_forward: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layer_order() {
        let config = ViewerConfig::default();
        let kinds: Vec<LayerKind> = config.layers().iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LayerKind::Ground, LayerKind::Water]);
    }

    #[test]
    fn test_without_water() {
        let config = ViewerConfig {
            water: None,
            ..ViewerConfig::default()
        };
        assert_eq!(config.layers().len(), 1);
    }
}
