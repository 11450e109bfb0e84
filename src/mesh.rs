//! Staggered tensor meshes for discretized current sources.
//!
//! Currents live on mesh edges. An edge current array has one entry per
//! edge, x-edges first, then y-edges, then z-edges, each block ordered with
//! x varying fastest, and holds current times edge length (A-m).

/// Rectilinear mesh described by cell widths along each axis.
#[derive(Clone, Debug, PartialEq)]
pub struct StaggeredMesh {
    hx: Vec<f64>,
    hy: Vec<f64>,
    hz: Vec<f64>,
    origin: [f64; 3],
}

/// Direction of a mesh edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// In edge array block order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// 0, 1, 2 for x, y, z
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Nonzero edge currents of a mesh, expressed as straight filament segments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeFilaments {
    /// (m) x, y, z of each segment's start point
    pub start: (Vec<f64>, Vec<f64>, Vec<f64>),
    /// (m) x, y, z of each segment's length vector
    pub dl: (Vec<f64>, Vec<f64>, Vec<f64>),
    /// (A) current in each segment
    pub current: Vec<f64>,
}

impl EdgeFilaments {
    fn push(&mut self, center: [f64; 3], axis: Axis, length: f64, current: f64) {
        let mut dl = [0.0; 3];
        dl[axis.index()] = length;

        self.start.0.push(dl[0].mul_add(-0.5, center[0]));
        self.start.1.push(dl[1].mul_add(-0.5, center[1]));
        self.start.2.push(dl[2].mul_add(-0.5, center[2]));
        self.dl.0.push(dl[0]);
        self.dl.1.push(dl[1]);
        self.dl.2.push(dl[2]);
        self.current.push(current);
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

impl StaggeredMesh {
    /// Mesh from cell widths on each axis and the location of the lowest corner.
    ///
    /// # Arguments
    ///
    /// * `hx`, `hy`, `hz`: (m) cell widths, each at least one cell, all positive
    /// * `origin`:         (m) x, y, z of the lowest node
    pub fn new(
        hx: Vec<f64>,
        hy: Vec<f64>,
        hz: Vec<f64>,
        origin: [f64; 3],
    ) -> Result<Self, &'static str> {
        if hx.is_empty() || hy.is_empty() || hz.is_empty() {
            return Err("Mesh must have at least one cell on each axis");
        }
        if hx.iter().chain(hy.iter()).chain(hz.iter()).any(|h| !(*h > 0.0)) {
            return Err("Mesh cell widths must be positive");
        }

        Ok(Self { hx, hy, hz, origin })
    }

    /// Mesh of `n` equal cells of width `h` on each axis.
    pub fn uniform(n: [usize; 3], h: [f64; 3], origin: [f64; 3]) -> Result<Self, &'static str> {
        Self::new(vec![h[0]; n[0]], vec![h[1]; n[1]], vec![h[2]; n[2]], origin)
    }

    /// Number of cells on each axis
    pub fn shape_cells(&self) -> [usize; 3] {
        [self.hx.len(), self.hy.len(), self.hz.len()]
    }

    /// Number of nodes on each axis
    pub fn shape_nodes(&self) -> [usize; 3] {
        let [nx, ny, nz] = self.shape_cells();
        [nx + 1, ny + 1, nz + 1]
    }

    /// (m) node coordinates along each axis
    pub fn nodes(&self) -> [Vec<f64>; 3] {
        [
            nodes_along(&self.hx, self.origin[0]),
            nodes_along(&self.hy, self.origin[1]),
            nodes_along(&self.hz, self.origin[2]),
        ]
    }

    /// (m) cell center coordinates along each axis
    pub fn cell_centers(&self) -> [Vec<f64>; 3] {
        self.nodes().map(|n| n.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect())
    }

    /// Number of edges parallel to x, y and z
    pub fn n_edges_axis(&self) -> [usize; 3] {
        let [cx, cy, cz] = self.shape_cells();
        let [nx, ny, nz] = self.shape_nodes();
        [cx * ny * nz, nx * cy * nz, nx * ny * cz]
    }

    /// Total number of edges
    pub fn n_edges(&self) -> usize {
        self.n_edges_axis().iter().sum()
    }

    /// (m) largest extent of the mesh on any axis
    pub fn extent(&self) -> f64 {
        [&self.hx, &self.hy, &self.hz]
            .iter()
            .map(|h| h.iter().sum::<f64>())
            .fold(0.0, f64::max)
    }

    /// (m) midpoints of the edges parallel to `axis`, ordered x-fastest.
    pub fn edge_grid(&self, axis: Axis) -> Vec<[f64; 3]> {
        let nodes = self.nodes();
        let centers = self.cell_centers();

        // Edges parallel to an axis sit at cell centers along it
        // and at nodes along the other two
        let mut coords: [&[f64]; 3] = [&nodes[0], &nodes[1], &nodes[2]];
        coords[axis.index()] = &centers[axis.index()];

        let mut grid = Vec::with_capacity(coords.iter().map(|c| c.len()).product());
        for &z in coords[2] {
            for &y in coords[1] {
                for &x in coords[0] {
                    grid.push([x, y, z]);
                }
            }
        }
        grid
    }

    /// (m) length of every edge, in edge array order
    pub fn edge_lengths(&self) -> Vec<f64> {
        let [nx, ny, nz] = self.shape_nodes();
        let mut lengths = Vec::with_capacity(self.n_edges());

        for _ in 0..ny * nz {
            lengths.extend_from_slice(&self.hx);
        }
        for _ in 0..nz {
            for &h in self.hy.iter() {
                lengths.extend(std::iter::repeat(h).take(nx));
            }
        }
        for &h in self.hz.iter() {
            lengths.extend(std::iter::repeat(h).take(nx * ny));
        }

        lengths
    }

    /// Nonzero entries of an edge current array (A-m) as filament segments
    /// centered on their edges.
    pub fn edge_filaments(&self, js: &[f64]) -> Result<EdgeFilaments, &'static str> {
        if js.len() != self.n_edges() {
            return Err("Edge current array does not match the number of mesh edges");
        }

        let lengths = self.edge_lengths();
        let mut filaments = EdgeFilaments::default();
        let mut offset = 0;
        for axis in Axis::ALL {
            let grid = self.edge_grid(axis);
            for (i, center) in grid.iter().enumerate() {
                let k = offset + i;
                if js[k] != 0.0 {
                    filaments.push(*center, axis, lengths[k], js[k] / lengths[k]);
                }
            }
            offset += grid.len();
        }

        Ok(filaments)
    }
}

/// Edge current array for a rectangular current path in a horizontal plane.
///
/// # Arguments
///
/// * `mesh`:    mesh carrying the current
/// * `corners`: (m) path corners, ordered bottom-left, top-left, top-right, bottom-right
///              looking down on the x-y plane; they must lie on mesh nodes
/// * `closed`:  whether to include the bottom side, closing the loop
/// * `current`: (A) current around the path
///
/// # Returns
///
/// * (A-m) current times edge length on each edge
///
/// # Commentary
///
/// The left side carries `-current` along y, the top side `-current` along x,
/// the right side `+current` along y and the bottom side `+current` along x,
/// so a closed path circulates counter-clockwise seen from +z.
///
/// Edge membership uses a tolerance of 1e-9 of the mesh extent rather than
/// exact float comparison, since node coordinates are accumulated sums.
pub fn rectangular_plane_layout(
    mesh: &StaggeredMesh,
    corners: [[f64; 3]; 4],
    closed: bool,
    current: f64,
) -> Vec<f64> {
    let tol = 1e-9 * mesh.extent();
    let nex = mesh.n_edges_axis()[0];
    let mut js = vec![0.0; mesh.n_edges()];

    let within = |v: f64, lo: f64, hi: f64| v >= lo - tol && v <= hi + tol;
    let on_side = |p: &[f64; 3], lo: [f64; 3], hi: [f64; 3]| {
        within(p[0], lo[0], hi[0]) && within(p[1], lo[1], hi[1]) && (p[2] - lo[2]).abs() <= tol
    };

    let ex = mesh.edge_grid(Axis::X);
    let ey = mesh.edge_grid(Axis::Y);
    let [c1, c2, c3, c4] = corners;

    // Left side, running down
    for (i, p) in ey.iter().enumerate() {
        if on_side(p, c1, c2) {
            js[nex + i] = -current;
        }
    }

    // Top side, running left
    for (i, p) in ex.iter().enumerate() {
        if on_side(p, c2, c3) {
            js[i] = -current;
        }
    }

    // Right side, running up
    for (i, p) in ey.iter().enumerate() {
        let lo = [c3[0], c4[1], c3[2]];
        let hi = [c4[0], c3[1], c3[2]];
        if on_side(p, lo, hi) {
            js[nex + i] = current;
        }
    }

    // Bottom side, running right
    if closed {
        for (i, p) in ex.iter().enumerate() {
            if on_side(p, c1, c4) {
                js[i] = current;
            }
        }
    }

    js.iter_mut()
        .zip(mesh.edge_lengths())
        .for_each(|(j, h)| *j *= h);

    js
}

/// Cumulative node positions from cell widths
fn nodes_along(h: &[f64], x0: f64) -> Vec<f64> {
    let mut nodes = Vec::with_capacity(h.len() + 1);
    nodes.push(x0);
    let mut x = x0;
    for dh in h {
        x += dh;
        nodes.push(x);
    }
    nodes
}
