//! Heightmap data structures, loading and mesh generation.
//!
//! This module provides:
//! - [`HeightSamples`] - Flat, row-major elevation samples
//! - [`GridSpec`] - Extent and resolution of the terrain plane
//! - [`loader`] - Numeric (JSON) and image heightmap loaders
//! - [`TerrainMesh`] - GPU-ready displaced grid mesh

pub mod loader;
pub mod mesh;

pub use loader::{HeightFormat, Source};
pub use mesh::{TerrainMesh, Vertex};

/// Elevation samples, one per grid vertex, in row-major order.
///
/// Image sources also record their pixel dimensions so the grid resolution
/// can follow the image.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightSamples {
    pub values: Vec<f32>,
    /// `(columns, rows)` of the source raster, if known
    pub dims: Option<(usize, usize)>,
}

impl HeightSamples {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, dims: None }
    }

    pub fn with_dims(values: Vec<f32>, columns: usize, rows: usize) -> Self {
        Self {
            values,
            dims: Some((columns, rows)),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns the minimum and maximum sample.
    ///
    /// Returns `(0.0, 0.0)` when there are no samples.
    pub fn bounds(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;

        for &h in &self.values {
            min = min.min(h);
            max = max.max(h);
        }

        if min > max {
            (0.0, 0.0)
        } else {
            (min, max)
        }
    }
}

/// Extent and subdivision of the terrain plane.
///
/// The plane is centered on the origin and lies in the XZ plane. Vertex
/// `i = row * (segments_x + 1) + column` sits at
/// `(column * width / segments_x - width / 2, h, row * depth / segments_z - depth / 2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Extent along X in world units
    pub width: f32,
    /// Extent along Z in world units
    pub depth: f32,
    pub segments_x: usize,
    pub segments_z: usize,
}

impl GridSpec {
    pub fn new(width: f32, depth: f32, segments_x: usize, segments_z: usize) -> Self {
        Self {
            width,
            depth,
            segments_x,
            segments_z,
        }
    }

    /// Number of vertex columns.
    pub fn columns(&self) -> usize {
        self.segments_x + 1
    }

    /// Number of vertex rows.
    pub fn rows(&self) -> usize {
        self.segments_z + 1
    }

    pub fn vertex_count(&self) -> usize {
        self.columns() * self.rows()
    }

    /// Derive a square grid from a sample count.
    ///
    /// `n * n` samples give `n - 1` segments per side. Returns `None` when the
    /// count is not a perfect square of at least 2x2.
    pub fn square_for(samples: usize, width: f32, depth: f32) -> Option<Self> {
        let side = (samples as f64).sqrt().round() as usize;
        if side < 2 || side * side != samples {
            return None;
        }
        Some(Self::new(width, depth, side - 1, side - 1))
    }

    /// Resolve the grid for a set of samples.
    ///
    /// An explicit segment count wins, then the raster dimensions of the
    /// samples, then a square inferred from the sample count.
    pub fn resolve(
        samples: &HeightSamples,
        segments: Option<(usize, usize)>,
        width: f32,
        depth: f32,
    ) -> Option<Self> {
        if let Some((sx, sz)) = segments {
            return Some(Self::new(width, depth, sx, sz));
        }
        if let Some((columns, rows)) = samples.dims {
            if columns >= 2 && rows >= 2 {
                return Some(Self::new(width, depth, columns - 1, rows - 1));
            }
        }
        Self::square_for(samples.len(), width, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_count() {
        let grid = GridSpec::new(16000.0, 16000.0, 255, 255);
        assert_eq!(grid.vertex_count(), 256 * 256);
    }

    #[test]
    fn test_square_for() {
        let grid = GridSpec::square_for(65536, 100.0, 100.0).unwrap();
        assert_eq!(grid.segments_x, 255);
        assert_eq!(grid.segments_z, 255);

        assert!(GridSpec::square_for(65535, 100.0, 100.0).is_none());
        assert!(GridSpec::square_for(1, 100.0, 100.0).is_none());
        assert!(GridSpec::square_for(0, 100.0, 100.0).is_none());
    }

    #[test]
    fn test_resolve_prefers_explicit_segments() {
        let samples = HeightSamples::with_dims(vec![0.0; 6], 3, 2);
        let grid = GridSpec::resolve(&samples, Some((1, 2)), 10.0, 10.0).unwrap();
        assert_eq!((grid.segments_x, grid.segments_z), (1, 2));
    }

    #[test]
    fn test_resolve_uses_raster_dims() {
        let samples = HeightSamples::with_dims(vec![0.0; 6], 3, 2);
        let grid = GridSpec::resolve(&samples, None, 10.0, 10.0).unwrap();
        assert_eq!((grid.segments_x, grid.segments_z), (2, 1));
    }

    #[test]
    fn test_resolve_unresolvable() {
        let samples = HeightSamples::new(vec![0.0; 7]);
        assert!(GridSpec::resolve(&samples, None, 10.0, 10.0).is_none());
    }

    #[test]
    fn test_bounds() {
        let samples = HeightSamples::new(vec![0.0, 5.0, -3.0, 10.0]);
        assert_eq!(samples.bounds(), (-3.0, 10.0));
        assert_eq!(HeightSamples::new(vec![]).bounds(), (0.0, 0.0));
    }
}
