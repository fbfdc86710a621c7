use crate::config::TerrainConfig;
use crate::model::{MeshData, Vertex};

/// Height of the hill profile at `distance` from the grid center.
pub fn hill_profile(distance: f32, plateau_radius: f32, hill_radius: f32, hill_height: f32) -> f32 {
    if distance < plateau_radius {
        hill_height
    } else if distance < hill_radius {
        // Only reachable when hill_radius > plateau_radius, so the band is non-empty.
        hill_height * (1.0 - (distance - plateau_radius) / (hill_radius - plateau_radius))
    } else {
        0.0
    }
}

/// Builds the heightfield vertices and its triangle list.
///
/// Vertices are laid out row by row (`z * size + x`). Each quad cell gets two
/// triangles wound `(tl, bl, tr), (tr, bl, br)`. A grid smaller than 2x2 has no
/// cells and therefore no indices.
pub fn generate(
    size: usize,
    cell_scale: f32,
    plateau_radius: f32,
    hill_radius: f32,
    hill_height: f32,
) -> (Vec<Vertex>, Vec<u32>) {
    let cells = size.saturating_sub(1);
    let mut vertices = Vec::with_capacity(size * size);
    let mut indices = Vec::with_capacity(6 * cells * cells);

    let center = (size / 2) as f32;

    for z in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dz = z as f32 - center;
            let distance = (dx * dx + dz * dz).sqrt();
            let height = hill_profile(distance, plateau_radius, hill_radius, hill_height);

            vertices.push(Vertex {
                position: [x as f32 * cell_scale, height, z as f32 * cell_scale],
                tex_coords: [x as f32 / size as f32, z as f32 / size as f32],
                normal: [0.0, 1.0, 0.0],
            });

            if x < cells && z < cells {
                let top_left = (z * size + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((z + 1) * size + x) as u32;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }
    }

    (vertices, indices)
}

/// Nearest-vertex height lookup. Anything off the grid reads as 0.
pub fn height_at(vertices: &[Vertex], size: usize, cell_scale: f32, x: f32, z: f32) -> f32 {
    if !(cell_scale > 0.0) {
        return 0.0;
    }

    let gx = (x / cell_scale).floor();
    let gz = (z / cell_scale).floor();
    if !gx.is_finite() || !gz.is_finite() || gx < 0.0 || gz < 0.0 {
        return 0.0;
    }

    let (ix, iz) = (gx as usize, gz as usize);
    if ix >= size || iz >= size {
        return 0.0;
    }

    vertices
        .get(iz * size + ix)
        .map(|vertex| vertex.position[1])
        .unwrap_or(0.0)
}

/// The generated landscape. Immutable once built.
pub struct Terrain {
    size: usize,
    cell_scale: f32,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Terrain {
    pub fn new(config: &TerrainConfig) -> Self {
        let (vertices, indices) = generate(
            config.size,
            config.cell_scale,
            config.plateau_radius,
            config.hill_radius,
            config.hill_height,
        );

        log::info!(
            "generated {}x{} terrain: {} vertices, {} triangles",
            config.size,
            config.size,
            vertices.len(),
            indices.len() / 3
        );

        Self {
            size: config.size,
            cell_scale: config.cell_scale,
            vertices,
            indices,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell_scale(&self) -> f32 {
        self.cell_scale
    }

    /// World-space length of one side of the grid.
    pub fn extent(&self) -> f32 {
        self.size as f32 * self.cell_scale
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn get_height(&self, x: f32, z: f32) -> f32 {
        height_at(&self.vertices, self.size, self.cell_scale, x, z)
    }

    pub fn mesh_data(&self) -> MeshData {
        MeshData {
            vertices: self.vertices.clone(),
            indices: self.indices.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TerrainConfig {
        TerrainConfig {
            size: 10,
            cell_scale: 1.0,
            plateau_radius: 2.0,
            hill_radius: 5.0,
            hill_height: 7.0,
        }
    }

    #[test]
    fn mesh_counts() {
        for size in [2usize, 3, 10, 31] {
            let (vertices, indices) = generate(size, 0.5, 2.0, 5.0, 1.0);
            assert_eq!(vertices.len(), size * size);
            assert_eq!(indices.len(), 6 * (size - 1) * (size - 1));
            assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        }
    }

    #[test]
    fn degenerate_sizes_have_no_triangles() {
        let (vertices, indices) = generate(0, 1.0, 2.0, 5.0, 7.0);
        assert!(vertices.is_empty());
        assert!(indices.is_empty());

        let (vertices, indices) = generate(1, 1.0, 2.0, 5.0, 7.0);
        assert_eq!(vertices.len(), 1);
        assert!(indices.is_empty());
    }

    #[test]
    fn first_cell_winding() {
        let (_, indices) = generate(3, 1.0, 0.0, 0.0, 0.0);
        assert_eq!(&indices[..6], &[0, 3, 1, 1, 3, 4]);
    }

    #[test]
    fn plateau_is_flat_and_outside_is_zero() {
        let config = small_config();
        let terrain = Terrain::new(&config);
        let center = (config.size / 2) as f32;

        for vertex in terrain.vertices() {
            let dx = vertex.position[0] - center;
            let dz = vertex.position[2] - center;
            let distance = (dx * dx + dz * dz).sqrt();
            if distance < config.plateau_radius {
                assert_eq!(vertex.position[1], config.hill_height);
            }
            if distance >= config.hill_radius {
                assert_eq!(vertex.position[1], 0.0);
            }
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn small_hill_scenario() {
        let terrain = Terrain::new(&small_config());
        assert_eq!(terrain.get_height(5.5, 5.5), 7.0);
        // Grid vertex (0, 5) sits exactly 5 from the center.
        assert!(terrain.get_height(0.5, 5.5).abs() < 1e-6);
        assert_eq!(hill_profile(10.0, 2.0, 5.0, 7.0), 0.0);
    }

    #[test]
    fn profile_is_continuous_at_both_radii() {
        let eps = 1e-4;
        let (plateau, hill, height) = (50.0, 300.0, 7.0);

        let inside = hill_profile(plateau - eps, plateau, hill, height);
        let at = hill_profile(plateau, plateau, hill, height);
        assert!((inside - at).abs() < 1e-3);

        let before = hill_profile(hill - eps, plateau, hill, height);
        let after = hill_profile(hill, plateau, hill, height);
        assert!((before - after).abs() < 1e-3);
    }

    #[test]
    fn empty_falloff_band_does_not_divide_by_zero() {
        assert_eq!(hill_profile(3.0, 3.0, 3.0, 7.0), 0.0);
        assert_eq!(hill_profile(2.0, 3.0, 1.0, 7.0), 7.0);
        assert_eq!(hill_profile(4.0, 3.0, 1.0, 7.0), 0.0);
    }

    #[test]
    fn texture_coordinates_span_grid() {
        let (vertices, _) = generate(4, 1.0, 0.0, 0.0, 0.0);
        assert_eq!(vertices[0].tex_coords, [0.0, 0.0]);
        assert_eq!(vertices[4 * 4 - 1].tex_coords, [0.75, 0.75]);
    }

    #[test]
    fn out_of_range_queries_read_zero() {
        let terrain = Terrain::new(&small_config());
        let extent = terrain.extent();
        assert_eq!(terrain.get_height(-0.01, 5.0), 0.0);
        assert_eq!(terrain.get_height(5.0, -3.0), 0.0);
        assert_eq!(terrain.get_height(extent, 5.0), 0.0);
        assert_eq!(terrain.get_height(5.0, extent + 100.0), 0.0);
        assert_eq!(terrain.get_height(f32::NAN, 5.0), 0.0);
        assert_eq!(terrain.get_height(f32::INFINITY, 5.0), 0.0);
    }

    #[test]
    fn lookup_is_nearest_cell_not_interpolated() {
        let terrain = Terrain::new(&small_config());
        // Vertex (7, 5) is at distance 2 (start of falloff), vertex (8, 5) at distance 3.
        let low = terrain.get_height(8.0, 5.0);
        assert_eq!(terrain.get_height(7.0, 5.0), 7.0);
        assert_eq!(terrain.get_height(7.99, 5.0), 7.0);
        assert!(low < 7.0);
    }
}
