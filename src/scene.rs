//! Scene description: background, lights and terrain layers.
//!
//! Layers are loaded one after another (heights, then texture) and the
//! finished [`Scene`] is handed to the renderer in one piece. A layer whose
//! heights fail to load is left out; a layer whose texture fails is kept and
//! shaded plain white. Every outcome is recorded in [`LayerStatus`].

use glam::Vec3;
use image::RgbaImage;

use crate::config::{LayerConfig, ViewerConfig};
use crate::terrain::loader::{self, HeightScale};
use crate::terrain::TerrainMesh;

/// Convert HSL (each component in `0.0..=1.0`) to linear RGB.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return [l, l, l];
    }

    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// Sky/ground gradient light.
#[derive(Debug, Clone, Copy)]
pub struct HemisphereLight {
    pub sky: [f32; 3],
    pub ground: [f32; 3],
    pub intensity: f32,
}

/// Sun-like light shining from `direction` (pointing toward the light).
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Lighting {
    pub hemisphere: HemisphereLight,
    pub sun: DirectionalLight,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            hemisphere: HemisphereLight {
                sky: hsl_to_rgb(0.6, 1.0, 0.6),
                ground: hsl_to_rgb(0.095, 1.0, 0.75),
                intensity: 0.6,
            },
            sun: DirectionalLight {
                direction: Vec3::new(-1.0, 1.75, 1.0).normalize(),
                color: hsl_to_rgb(0.1, 1.0, 0.95),
                intensity: 1.0,
            },
        }
    }
}

/// Which surface a layer represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Ground,
    Water,
}

impl LayerKind {
    pub fn label(self) -> &'static str {
        match self {
            LayerKind::Ground => "Ground",
            LayerKind::Water => "Water",
        }
    }
}

/// A loaded terrain surface.
pub struct Layer {
    pub kind: LayerKind,
    pub mesh: TerrainMesh,
    pub texture: Option<RgbaImage>,
}

/// Outcome of loading one configured layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerStatus {
    Loaded(LayerKind),
    /// Heights loaded, texture did not
    Untextured(LayerKind, String),
    Failed(LayerKind, String),
}

impl LayerStatus {
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerStatus::Loaded(kind)
            | LayerStatus::Untextured(kind, _)
            | LayerStatus::Failed(kind, _) => *kind,
        }
    }
}

pub struct Scene {
    pub background: [f32; 3],
    pub lighting: Lighting,
    pub layers: Vec<Layer>,
    pub status: Vec<LayerStatus>,
}

impl Scene {
    pub fn empty() -> Self {
        Self {
            background: hsl_to_rgb(0.556, 1.0, 0.85),
            lighting: Lighting::default(),
            layers: Vec::new(),
            status: Vec::new(),
        }
    }

    /// Load every configured layer in order.
    pub fn load(config: &ViewerConfig) -> Self {
        let mut scene = Self::empty();
        for layer in config.layers() {
            scene.load_layer(config, &layer);
        }
        scene
    }

    /// Drop layers whose buffers exceed the device's `max_buffer_size`.
    pub fn enforce_buffer_limit(&mut self, limit: u64) {
        let mut rejected = Vec::new();
        self.layers.retain(|layer| match layer.mesh.check_buffer_limit(limit) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{} layer skipped: {}", layer.kind.label(), e);
                rejected.push((layer.kind, e.to_string()));
                false
            }
        });

        for (kind, message) in rejected {
            for status in self.status.iter_mut().filter(|s| s.kind() == kind) {
                *status = LayerStatus::Failed(kind, message.clone());
            }
        }
    }

    fn load_layer(&mut self, config: &ViewerConfig, layer: &LayerConfig) {
        let kind = layer.kind;
        let scale = HeightScale {
            numeric: config.numeric_scale,
            image: config.image_scale,
        };

        let mesh = loader::load_heights(&layer.heights, config.format, scale)
            .map_err(|e| e.to_string())
            .and_then(|samples| {
                let (min, max) = samples.bounds();
                log::info!(
                    "{} heights: {} samples from {}, range {:.2}..{:.2}",
                    kind.label(),
                    samples.len(),
                    layer.heights,
                    min,
                    max
                );
                TerrainMesh::build(&samples, config.segments, config.size, config.size)
                    .map_err(|e| e.to_string())
            });

        let mesh = match mesh {
            Ok(mesh) => mesh,
            Err(message) => {
                log::warn!("{} layer skipped: {}", kind.label(), message);
                self.status.push(LayerStatus::Failed(kind, message));
                return;
            }
        };

        let texture = match &layer.texture {
            Some(source) => match loader::load_texture(source) {
                Ok(image) => {
                    log::info!(
                        "{} texture: {}x{} from {}",
                        kind.label(),
                        image.width(),
                        image.height(),
                        source
                    );
                    Ok(Some(image))
                }
                Err(e) => {
                    log::warn!("{} texture unavailable: {}", kind.label(), e);
                    Err(e.to_string())
                }
            },
            None => Ok(None),
        };

        let (texture, status) = match texture {
            Ok(texture) => (texture, LayerStatus::Loaded(kind)),
            Err(message) => (None, LayerStatus::Untextured(kind, message)),
        };

        self.layers.push(Layer {
            kind,
            mesh,
            texture,
        });
        self.status.push(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Source;
    use std::io::Write;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn test_hsl_primaries() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]));
        assert!(close(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), [0.0, 1.0, 0.0]));
        assert!(close(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_hsl_grey_and_extremes() {
        assert!(close(hsl_to_rgb(0.3, 0.0, 0.25), [0.25, 0.25, 0.25]));
        assert!(close(hsl_to_rgb(0.7, 1.0, 1.0), [1.0, 1.0, 1.0]));
        assert!(close(hsl_to_rgb(0.7, 1.0, 0.0), [0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_background_is_light_sky_blue() {
        let [r, g, b] = Scene::empty().background;
        assert!(b > g && g > r);
        assert!(r > 0.6);
    }

    fn write_json(dir: &tempfile::TempDir, name: &str, body: &str) -> Source {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", body).unwrap();
        Source::Path(path)
    }

    fn config_with(ground: Source, texture: Option<Source>, water: Option<Source>) -> ViewerConfig {
        ViewerConfig {
            ground: LayerConfig {
                kind: LayerKind::Ground,
                heights: ground,
                texture,
            },
            water: water.map(|heights| LayerConfig {
                kind: LayerKind::Water,
                heights,
                texture: None,
            }),
            numeric_scale: 1.0,
            ..ViewerConfig::default()
        }
    }

    #[test]
    fn test_load_ground_without_texture() {
        let dir = tempfile::tempdir().unwrap();
        let ground = write_json(&dir, "ground.json", "[0, 1, 2, 3]");

        let scene = Scene::load(&config_with(ground, None, None));

        assert_eq!(scene.layers.len(), 1);
        assert_eq!(scene.status, vec![LayerStatus::Loaded(LayerKind::Ground)]);
        let heights: Vec<f32> = scene.layers[0]
            .mesh
            .vertices
            .iter()
            .map(|v| v.position[1])
            .collect();
        assert_eq!(heights, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_missing_texture_keeps_layer() {
        let dir = tempfile::tempdir().unwrap();
        let ground = write_json(&dir, "ground.json", "[0, 0, 0, 0]");
        let texture = Source::Path(dir.path().join("missing.png"));

        let scene = Scene::load(&config_with(ground, Some(texture), None));

        assert_eq!(scene.layers.len(), 1);
        assert!(scene.layers[0].texture.is_none());
        assert!(matches!(
            scene.status[0],
            LayerStatus::Untextured(LayerKind::Ground, _)
        ));
    }

    #[test]
    fn test_failed_heights_skip_layer_only() {
        let dir = tempfile::tempdir().unwrap();
        let ground = Source::Path(dir.path().join("missing.json"));
        let water = write_json(&dir, "water.json", "[5, 5, 5, 5]");

        let scene = Scene::load(&config_with(ground, None, Some(water)));

        assert_eq!(scene.layers.len(), 1);
        assert_eq!(scene.layers[0].kind, LayerKind::Water);
        assert_eq!(scene.status.len(), 2);
        assert!(matches!(scene.status[0], LayerStatus::Failed(LayerKind::Ground, _)));
        assert_eq!(scene.status[1], LayerStatus::Loaded(LayerKind::Water));
    }

    #[test]
    fn test_oversized_layer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ground = write_json(&dir, "ground.json", &format!("[{}]", vec!["0"; 16].join(",")));
        let water = write_json(&dir, "water.json", "[1, 1, 1, 1]");

        let mut scene = Scene::load(&config_with(ground, None, Some(water)));
        assert_eq!(scene.layers.len(), 2);

        // Room for the 4-vertex water mesh, not the 16-vertex ground mesh
        scene.enforce_buffer_limit(4 * 32);

        assert_eq!(scene.layers.len(), 1);
        assert_eq!(scene.layers[0].kind, LayerKind::Water);
        match &scene.status[0] {
            LayerStatus::Failed(LayerKind::Ground, reason) => assert!(reason.contains("512")),
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(scene.status[1], LayerStatus::Loaded(LayerKind::Water));
    }

    #[test]
    fn test_mismatched_grid_fails_layer() {
        let dir = tempfile::tempdir().unwrap();
        let ground = write_json(&dir, "ground.json", "[0, 1, 2]");

        let scene = Scene::load(&config_with(ground, None, None));

        assert!(scene.layers.is_empty());
        assert_eq!(scene.status[0].kind(), LayerKind::Ground);
    }
}
