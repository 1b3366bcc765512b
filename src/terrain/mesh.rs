use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use thiserror::Error;

use super::{GridSpec, HeightSamples};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MeshError {
    #[error("Heightmap has {actual} samples, grid needs {expected}")]
    SampleCountMismatch { expected: usize, actual: usize },
    #[error("Cannot derive a grid resolution from {0} samples, pass --segments")]
    UnresolvedGrid(usize),
    #[error("Mesh needs a {bytes} byte buffer, device allows {limit}")]
    BufferTooLarge { bytes: u64, limit: u64 },
}

/// Vertex data for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Displaced grid mesh ready for GPU upload
pub struct TerrainMesh {
    pub vertices: Vec<Vertex>,
    /// Line list for wireframe display
    pub indices: Vec<u32>,
    /// Triangle list, counter-clockwise seen from +Y
    pub triangle_indices: Vec<u32>,
}

impl TerrainMesh {
    /// Build a horizontal grid mesh whose vertex `i` is raised to `samples[i]`.
    ///
    /// Heights are applied as-is, without interpolation. The sample count must
    /// equal the grid's vertex count.
    pub fn from_samples(grid: &GridSpec, samples: &HeightSamples) -> Result<Self, MeshError> {
        let expected = grid.vertex_count();
        if samples.len() != expected {
            return Err(MeshError::SampleCountMismatch {
                expected,
                actual: samples.len(),
            });
        }

        let columns = grid.columns();
        let rows = grid.rows();
        let step_x = grid.width / grid.segments_x as f32;
        let step_z = grid.depth / grid.segments_z as f32;
        let half_w = grid.width / 2.0;
        let half_d = grid.depth / 2.0;

        let mut vertices = Vec::with_capacity(expected);
        for row in 0..rows {
            for column in 0..columns {
                let h = samples.values[row * columns + column];
                vertices.push(Vertex {
                    position: [
                        column as f32 * step_x - half_w,
                        h,
                        row as f32 * step_z - half_d,
                    ],
                    normal: [0.0, 1.0, 0.0],
                    uv: [
                        column as f32 / grid.segments_x as f32,
                        row as f32 / grid.segments_z as f32,
                    ],
                });
            }
        }

        let triangle_indices = triangle_indices(columns, rows);
        let indices = line_indices(columns, rows);
        compute_normals(&mut vertices, &triangle_indices);

        Ok(Self {
            vertices,
            indices,
            triangle_indices,
        })
    }

    /// Resolve the grid for `samples` and build the mesh.
    pub fn build(
        samples: &HeightSamples,
        segments: Option<(usize, usize)>,
        width: f32,
        depth: f32,
    ) -> Result<Self, MeshError> {
        let grid = GridSpec::resolve(samples, segments, width, depth)
            .ok_or(MeshError::UnresolvedGrid(samples.len()))?;
        Self::from_samples(&grid, samples)
    }
}

impl TerrainMesh {
    /// Size in bytes of the largest GPU buffer this mesh uploads.
    pub fn largest_buffer_size(&self) -> u64 {
        let vertex = std::mem::size_of_val(self.vertices.as_slice());
        let triangles = std::mem::size_of_val(self.triangle_indices.as_slice());
        let lines = std::mem::size_of_val(self.indices.as_slice());
        vertex.max(triangles).max(lines) as u64
    }

    /// Fail if any of the mesh buffers exceeds `limit` bytes.
    pub fn check_buffer_limit(&self, limit: u64) -> Result<(), MeshError> {
        let bytes = self.largest_buffer_size();
        if bytes > limit {
            return Err(MeshError::BufferTooLarge { bytes, limit });
        }
        Ok(())
    }
}

/// Two triangles per cell: (a, b, d) and (b, c, d) where a is the cell's
/// top-left corner and b is directly below it.
fn triangle_indices(columns: usize, rows: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity((columns - 1) * (rows - 1) * 6);
    for row in 0..rows - 1 {
        for column in 0..columns - 1 {
            let a = (row * columns + column) as u32;
            let b = a + columns as u32;
            let c = b + 1;
            let d = a + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    indices
}

fn line_indices(columns: usize, rows: usize) -> Vec<u32> {
    let mut indices = Vec::new();

    // Horizontal lines
    for row in 0..rows {
        for column in 0..columns - 1 {
            let i = (row * columns + column) as u32;
            indices.push(i);
            indices.push(i + 1);
        }
    }

    // Vertical lines
    for row in 0..rows - 1 {
        for column in 0..columns {
            let i = (row * columns + column) as u32;
            indices.push(i);
            indices.push(i + columns as u32);
        }
    }

    indices
}

/// Smooth normals: area-weighted sum of adjacent face normals.
fn compute_normals(vertices: &mut [Vertex], triangles: &[u32]) {
    let mut accum = vec![Vec3::ZERO; vertices.len()];

    for tri in triangles.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from(vertices[a].position);
        let pb = Vec3::from(vertices[b].position);
        let pc = Vec3::from(vertices[c].position);
        let face = (pb - pa).cross(pc - pa);
        accum[a] += face;
        accum[b] += face;
        accum[c] += face;
    }

    for (vertex, n) in vertices.iter_mut().zip(accum) {
        vertex.normal = n.try_normalize().unwrap_or(Vec3::Y).to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: Vec<f32>) -> HeightSamples {
        HeightSamples::new(values)
    }

    #[test]
    fn test_vertex_elevation_matches_samples() {
        let grid = GridSpec::new(30.0, 20.0, 3, 2);
        let values: Vec<f32> = (0..12).map(|i| i as f32 * 1.25 - 3.0).collect();
        let mesh = TerrainMesh::from_samples(&grid, &samples(values.clone())).unwrap();

        assert_eq!(mesh.vertices.len(), 12);
        for (vertex, h) in mesh.vertices.iter().zip(&values) {
            assert_eq!(vertex.position[1], *h);
        }
    }

    #[test]
    fn test_sample_count_mismatch() {
        let grid = GridSpec::new(10.0, 10.0, 255, 255);
        let result = TerrainMesh::from_samples(&grid, &samples(vec![0.0; 100]));

        assert_eq!(
            result.err(),
            Some(MeshError::SampleCountMismatch {
                expected: 65536,
                actual: 100
            })
        );
    }

    #[test]
    fn test_grid_layout_row_major() {
        let grid = GridSpec::new(2.0, 4.0, 2, 2);
        let mesh = TerrainMesh::from_samples(&grid, &samples(vec![0.0; 9])).unwrap();

        // First row sits at -depth/2 and runs along +X
        assert_eq!(mesh.vertices[0].position, [-1.0, 0.0, -2.0]);
        assert_eq!(mesh.vertices[1].position, [0.0, 0.0, -2.0]);
        assert_eq!(mesh.vertices[2].position, [1.0, 0.0, -2.0]);
        // Next row steps along +Z
        assert_eq!(mesh.vertices[3].position, [-1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[8].position, [1.0, 0.0, 2.0]);

        assert_eq!(mesh.vertices[0].uv, [0.0, 0.0]);
        assert_eq!(mesh.vertices[8].uv, [1.0, 1.0]);
    }

    #[test]
    fn test_index_counts() {
        let grid = GridSpec::new(1.0, 1.0, 1, 1);
        let mesh = TerrainMesh::from_samples(&grid, &samples(vec![0.0; 4])).unwrap();

        // One cell: 2 triangles
        assert_eq!(mesh.triangle_indices, vec![0, 2, 1, 2, 3, 1]);
        // 2 horizontal + 2 vertical edges
        assert_eq!(mesh.indices.len(), 8);
    }

    #[test]
    fn test_triangles_face_up() {
        let grid = GridSpec::new(4.0, 4.0, 2, 2);
        let mesh = TerrainMesh::from_samples(&grid, &samples(vec![0.0; 9])).unwrap();

        for tri in mesh.triangle_indices.chunks_exact(3) {
            let p = |i: u32| Vec3::from(mesh.vertices[i as usize].position);
            let n = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(n.y > 0.0, "triangle {:?} faces down", tri);
        }
        for vertex in &mesh.vertices {
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_build_infers_square_grid() {
        let mesh = TerrainMesh::build(&samples(vec![1.0; 16]), None, 10.0, 10.0).unwrap();
        assert_eq!(mesh.vertices.len(), 16);
        assert_eq!(mesh.triangle_indices.len(), 3 * 3 * 6);

        let result = TerrainMesh::build(&samples(vec![1.0; 15]), None, 10.0, 10.0);
        assert_eq!(result.err(), Some(MeshError::UnresolvedGrid(15)));
    }

    #[test]
    fn test_buffer_limit() {
        let grid = GridSpec::new(4.0, 4.0, 2, 2);
        let mesh = TerrainMesh::from_samples(&grid, &samples(vec![0.0; 9])).unwrap();

        // Nine 32-byte vertices outweigh 24 indices of either kind
        assert_eq!(mesh.largest_buffer_size(), 9 * 32);
        assert!(mesh.check_buffer_limit(288).is_ok());
        assert_eq!(
            mesh.check_buffer_limit(287),
            Err(MeshError::BufferTooLarge {
                bytes: 288,
                limit: 287
            })
        );
    }
}
