//! Biot-Savart calculations for B-field from current filaments and mesh edge currents.
use rayon::{
    iter::{IntoParallelIterator, ParallelIterator},
    slice::{ParallelSlice, ParallelSliceMut},
};

use crate::{
    chunksize,
    macros::{check_length, check_length_3tup, mut_par_chunks_3tup, par_chunks_3tup},
    math::{cross3, dot3},
    mesh::StaggeredMesh,
    MU0_OVER_4PI,
};

/// Biot-Savart calculation for B-field contribution from many current filament
/// segments to many observation points.
///
/// # Arguments
///
/// * `xyzp`:     (m) Observation point coords, each length `n`
/// * `xyzfil`:   (m) Filament origin coords (start of segment), each length `m`
/// * `dlxyzfil`: (m) Filament segment length deltas, each length `m`
/// * `ifil`:     (A) Filament current, length `m`
/// * `out`:      (T) bx, by, bz accumulated at observation points, each length `n`
///
/// # Commentary
///
/// Each segment is lumped at its midpoint, so segments should be short
/// compared to their distance from the observation points.
pub fn flux_density_biot_savart(
    xyzp: (&[f64], &[f64], &[f64]),
    xyzfil: (&[f64], &[f64], &[f64]),
    dlxyzfil: (&[f64], &[f64], &[f64]),
    ifil: &[f64],
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    // Unpack
    let (xp, yp, zp) = xyzp;
    let (xfil, yfil, zfil) = xyzfil;
    let (dlxfil, dlyfil, dlzfil) = dlxyzfil;
    let (bx, by, bz) = out;

    // Check lengths; if there is any possibility of mismatch,
    // the compiler will bypass vectorization
    let m = xfil.len();
    let n = xp.len();
    check_length!(n, yp, zp, bx, by, bz);
    check_length!(m, yfil, zfil, dlxfil, dlyfil, dlzfil, ifil);

    // For each filament, evaluate the contribution to each observation point
    for i in 0..m {
        // Get filament midpoint
        let dlxi = dlxfil[i]; // [m]
        let dlyi = dlyfil[i]; // [m]
        let dlzi = dlzfil[i]; // [m]
        let xmid = dlxi.mul_add(0.5, xfil[i]); // [m]
        let ymid = dlyi.mul_add(0.5, yfil[i]); // [m]
        let zmid = dlzi.mul_add(0.5, zfil[i]); // [m]

        // Get filament current and bake in the constant factor
        let ifil_scaled = MU0_OVER_4PI * ifil[i]; // [T-m]

        for j in 0..n {
            // Distance from middle of the filament segment to the observation point
            let rx = xp[j] - xmid; // [m]
            let ry = yp[j] - ymid; // [m]
            let rz = zp[j] - zmid; // [m]

            // 1/r^3 without forming the cube, rolled into the factor
            // shared by all three components
            let sumsq = dot3(rx, ry, rz, rx, ry, rz);
            let c = sumsq.powf(-1.5) * ifil_scaled;

            let (cx, cy, cz) = cross3(dlxi, dlyi, dlzi, rx, ry, rz);

            bx[j] = c.mul_add(cx, bx[j]);
            by[j] = c.mul_add(cy, by[j]);
            bz[j] = c.mul_add(cz, bz[j]);
        }
    }

    Ok(())
}

/// Biot-Savart calculation for B-field contribution from many current filament
/// segments to many observation points. This variant of the function is
/// parallelized over chunks of observation points.
/// For more details, see [flux_density_biot_savart].
pub fn flux_density_biot_savart_par(
    xyzp: (&[f64], &[f64], &[f64]),
    xyzfil: (&[f64], &[f64], &[f64]),
    dlxyzfil: (&[f64], &[f64], &[f64]),
    ifil: &[f64],
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    let n = xyzp.0.len();
    check_length_3tup!(n, &xyzp);
    check_length!(n, out.0, out.1, out.2);

    // Chunk inputs
    let nchunk = chunksize(n);
    let (xpc, ypc, zpc) = par_chunks_3tup!(xyzp, nchunk);
    let (bxc, byc, bzc) = mut_par_chunks_3tup!(out, nchunk);

    // Run calcs
    (bxc, byc, bzc, xpc, ypc, zpc)
        .into_par_iter()
        .try_for_each(|(bx, by, bz, xp, yp, zp)| {
            flux_density_biot_savart((xp, yp, zp), xyzfil, dlxyzfil, ifil, (bx, by, bz))
        })?;

    Ok(())
}

/// B-field from current on the edges of a staggered mesh.
///
/// # Arguments
///
/// * `xyzp`: (m) Observation point coords, each length `n`
/// * `mesh`: mesh carrying the current
/// * `js`:   (A-m) current times edge length on every mesh edge, length `mesh.n_edges()`
/// * `out`:  (T) bx, by, bz accumulated at observation points, each length `n`
///
/// # Commentary
///
/// Every nonzero edge acts as a straight segment centered on the edge,
/// contributing $\frac{\mu_0}{4\pi} J_s \hat{e} \times r / |r|^3$.
/// Zero edges are skipped, so the result does not depend on how many
/// edges the mesh has away from the current path.
pub fn flux_density_mesh_biot_savart(
    xyzp: (&[f64], &[f64], &[f64]),
    mesh: &StaggeredMesh,
    js: &[f64],
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    let fils = mesh.edge_filaments(js)?;
    flux_density_biot_savart(
        xyzp,
        (&fils.start.0, &fils.start.1, &fils.start.2),
        (&fils.dl.0, &fils.dl.1, &fils.dl.2),
        &fils.current,
        out,
    )
}

/// B-field from current on the edges of a staggered mesh.
/// Parallelized over chunks of observation points.
/// For more details, see [flux_density_mesh_biot_savart].
pub fn flux_density_mesh_biot_savart_par(
    xyzp: (&[f64], &[f64], &[f64]),
    mesh: &StaggeredMesh,
    js: &[f64],
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> Result<(), &'static str> {
    let fils = mesh.edge_filaments(js)?;
    flux_density_biot_savart_par(
        xyzp,
        (&fils.start.0, &fils.start.1, &fils.start.2),
        (&fils.dl.0, &fils.dl.1, &fils.dl.2),
        &fils.current,
        out,
    )
}

#[cfg(test)]
mod test {
    use core::f64::consts::PI;

    use super::*;
    use crate::mesh::{rectangular_plane_layout, Axis};
    use crate::physics::circular_loop::flux_density_circular_loop;
    use crate::physics::point_source::flux_density_dipole_z;
    use crate::testing::*;
    use crate::MU_0;

    fn square_loop() -> (StaggeredMesh, Vec<f64>) {
        let mesh =
            StaggeredMesh::uniform([40, 40, 4], [0.1, 0.1, 0.1], [-2.0, -2.0, -0.2]).unwrap();
        let corners = [
            [-1.0, -1.0, 0.0],
            [-1.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, -1.0, 0.0],
        ];
        let js = rectangular_plane_layout(&mesh, corners, true, 1.0);
        (mesh, js)
    }

    /// The same 2m square loop standing in the y = 0 plane, carried on x- and z-edges
    fn vertical_square_loop() -> (StaggeredMesh, Vec<f64>) {
        let mesh =
            StaggeredMesh::uniform([40, 4, 40], [0.1, 0.1, 0.1], [-2.0, -0.2, -2.0]).unwrap();
        let [nex, ney, _] = mesh.n_edges_axis();
        let lengths = mesh.edge_lengths();
        let tol = 1e-9;
        let mut js = vec![0.0; mesh.n_edges()];

        // Bottom side runs +x, top side -x
        for (i, p) in mesh.edge_grid(Axis::X).iter().enumerate() {
            if p[1].abs() < tol && p[0].abs() < 1.0 && (p[2].abs() - 1.0).abs() < tol {
                js[i] = -p[2].signum() * lengths[i];
            }
        }

        // Right side runs +z, left side -z
        for (i, p) in mesh.edge_grid(Axis::Z).iter().enumerate() {
            if p[1].abs() < tol && p[2].abs() < 1.0 && (p[0].abs() - 1.0).abs() < tol {
                let k = nex + ney + i;
                js[k] = p[0].signum() * lengths[k];
            }
        }

        (mesh, js)
    }

    /// A discretized loop converges to the analytic circular loop
    #[test]
    fn test_filaments_vs_circular_loop() {
        let (a, zfil, current) = (0.6, -0.4, 2.0);
        let (xyzfil, dlxyzfil) = discretize_circular_loop(a, zfil, 1000);
        let ifil = vec![current; xyzfil.0.len()];

        let (x, y, z) = example_observation_points();
        let n = x.len();

        let (mut bx, mut by, mut bz) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        flux_density_biot_savart_par(
            (&x, &y, &z),
            (&xyzfil.0, &xyzfil.1, &xyzfil.2),
            (&dlxyzfil.0, &dlxyzfil.1, &dlxyzfil.2),
            &ifil,
            (&mut bx, &mut by, &mut bz),
        )
        .unwrap();

        let (mut bxc, mut byc, mut bzc) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        flux_density_circular_loop(
            (&[a], &[zfil], &[current]),
            (&x, &y, &z),
            (&mut bxc, &mut byc, &mut bzc),
        )
        .unwrap();

        for i in 0..n {
            let bmag = (bxc[i].powi(2) + byc[i].powi(2) + bzc[i].powi(2)).sqrt();
            assert!(approx(bxc[i], bx[i], 0.0, 1e-3 * bmag));
            assert!(approx(byc[i], by[i], 0.0, 1e-3 * bmag));
            assert!(approx(bzc[i], bz[i], 0.0, 1e-3 * bmag));
        }
    }

    /// Center of a square loop of side `L`: $2\sqrt{2}\mu_0 I / (\pi L)$
    #[test]
    fn test_square_loop_center() {
        let (mesh, js) = square_loop();
        let (mut bx, mut by, mut bz) = (vec![0.0], vec![0.0], vec![0.0]);
        let obs: (&[f64], &[f64], &[f64]) = (&[0.0], &[0.0], &[0.0]);
        flux_density_mesh_biot_savart(obs, &mesh, &js, (&mut bx, &mut by, &mut bz)).unwrap();

        let side = 2.0; // [m]
        let expected = 2.0 * 2.0_f64.sqrt() * MU_0 * 1.0 / (PI * side);
        assert!(bx[0].abs() < 1e-12 * expected);
        assert!(by[0].abs() < 1e-12 * expected);
        assert!(approx(expected, bz[0], 1e-3, 0.0));
    }

    /// Current on z-edges: the standing loop gives the same center field, along -y
    #[test]
    fn test_vertical_square_loop_center() {
        let (mesh, js) = vertical_square_loop();
        let [nex, ney, nez] = mesh.n_edges_axis();
        assert_eq!(nex + ney + nez, js.len());
        assert_eq!(40, js[..nex].iter().filter(|j| **j != 0.0).count());
        assert_eq!(40, js[nex + ney..].iter().filter(|j| **j != 0.0).count());

        let fils = mesh.edge_filaments(&js).unwrap();
        assert_eq!(80, fils.len());
        assert_eq!(40, fils.dl.2.iter().filter(|dl| **dl != 0.0).count());

        let obs: (&[f64], &[f64], &[f64]) = (&[0.0], &[0.0], &[0.0]);
        let (mut bx, mut by, mut bz) = (vec![0.0], vec![0.0], vec![0.0]);
        flux_density_mesh_biot_savart_par(obs, &mesh, &js, (&mut bx, &mut by, &mut bz)).unwrap();

        let side = 2.0; // [m]
        let expected = 2.0 * 2.0_f64.sqrt() * MU_0 * 1.0 / (PI * side);
        assert!(bx[0].abs() < 1e-12 * expected);
        assert!(bz[0].abs() < 1e-12 * expected);
        assert!(approx(-expected, by[0], 1e-3, 0.0));

        // Same discretization as the flat loop, turned a quarter turn about x
        let (flat_mesh, flat_js) = square_loop();
        let (mut fx, mut fy, mut fz) = (vec![0.0], vec![0.0], vec![0.0]);
        flux_density_mesh_biot_savart(obs, &flat_mesh, &flat_js, (&mut fx, &mut fy, &mut fz))
            .unwrap();
        assert!(approx(fz[0], -by[0], 1e-9, 0.0));
    }

    /// Far from the loop it looks like a dipole of moment I * area
    #[test]
    fn test_square_loop_far_field() {
        let (mesh, js) = square_loop();
        let x = [0.0, 15.0, -8.0, 30.0];
        let y = [0.0, 10.0, 20.0, -5.0];
        let z = [25.0, 12.0, -20.0, 3.0];

        let (mut bx, mut by, mut bz) = (vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]);
        let out = (&mut bx[..], &mut by[..], &mut bz[..]);
        flux_density_mesh_biot_savart_par((&x, &y, &z), &mesh, &js, out).unwrap();

        let (mut bxd, mut byd, mut bzd) = (vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]);
        flux_density_dipole_z(4.0, (&x, &y, &z), (&mut bxd, &mut byd, &mut bzd)).unwrap();

        for i in 0..4 {
            let bmag = (bxd[i].powi(2) + byd[i].powi(2) + bzd[i].powi(2)).sqrt();
            assert!(approx(bxd[i], bx[i], 0.0, 1e-2 * bmag));
            assert!(approx(byd[i], by[i], 0.0, 1e-2 * bmag));
            assert!(approx(bzd[i], bz[i], 0.0, 1e-2 * bmag));
        }
    }

    /// Empty edges contribute nothing
    #[test]
    fn test_mesh_zero_current() {
        let (mesh, js) = square_loop();
        let zeros = vec![0.0; js.len()];
        let (mut bx, mut by, mut bz) = (vec![0.0; 2], vec![0.0; 2], vec![0.0; 2]);
        flux_density_mesh_biot_savart(
            (&[0.3, 5.0], &[0.1, 2.0], &[0.5, -1.0]),
            &mesh,
            &zeros,
            (&mut bx, &mut by, &mut bz),
        )
        .unwrap();
        assert_eq!(vec![0.0; 2], bx);
        assert_eq!(vec![0.0; 2], by);
        assert_eq!(vec![0.0; 2], bz);
    }

    #[test]
    fn test_serial_vs_parallel() {
        let (mesh, js) = square_loop();
        let (x, y, z) = example_observation_points();
        let n = x.len();

        let (mut bx0, mut by0, mut bz0) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        let out0 = (&mut bx0[..], &mut by0[..], &mut bz0[..]);
        flux_density_mesh_biot_savart((&x, &y, &z), &mesh, &js, out0).unwrap();

        let (mut bx1, mut by1, mut bz1) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        let out1 = (&mut bx1[..], &mut by1[..], &mut bz1[..]);
        flux_density_mesh_biot_savart_par((&x, &y, &z), &mesh, &js, out1).unwrap();

        assert_eq!(bx0, bx1);
        assert_eq!(by0, by1);
        assert_eq!(bz0, bz1);
    }

    #[test]
    fn test_length_mismatch() {
        let (mut bx, mut by, mut bz) = (vec![0.0; 1], vec![0.0; 1], vec![0.0; 1]);
        let res = flux_density_biot_savart(
            (&[0.0], &[0.0], &[0.0]),
            (&[0.0, 1.0], &[0.0, 1.0], &[0.0, 1.0]),
            (&[1.0, 1.0], &[0.0, 0.0], &[0.0, 0.0]),
            &[1.0],
            (&mut bx, &mut by, &mut bz),
        );
        assert!(res.is_err());
    }
}
