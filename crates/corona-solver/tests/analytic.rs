//! Stencil updates compared against analytic curls of sinusoidal fields.

use corona_core::constants::C;
use corona_core::{Backend, Real};
use corona_mesh::{Dimensionality, Geometry, IndexBox};
use corona_solver::{evolve_b, evolve_e, CurrentDensity, EmFields, StencilCoefficients};
use proptest::prelude::*;

const DX: Real = 1e-3;
const DT: Real = 1e-13;
const CELLS: usize = 32;

fn wavenumber() -> Real {
    2.0 * std::f64::consts::PI / (CELLS as Real * DX)
}

/// Relative tolerance for centred differences with 32 cells per
/// wavelength: the truncation error is `(k dx)^2 / 6`, about 0.64%.
const REL_TOL: Real = 0.01;

fn geometry(extent: [usize; 3], dim: Dimensionality) -> Geometry {
    let domain = IndexBox::from_extent(extent).unwrap();
    Geometry::new([0.0; 3], [DX; 3], domain, dim).unwrap()
}

// ---------------------------------------------------------------------------
// Full 3-D stencil
// ---------------------------------------------------------------------------

#[test]
fn faraday_3d_by_from_ez_along_x() {
    let g = geometry([CELLS, 4, 4], Dimensionality::Three);
    let k = wavenumber();
    let mut f = EmFields::from_fn(g.domain(), [1, 1, 1], |iv| {
        let x = g.node_position(iv)[0];
        ([0.0, 0.0, (k * x).sin()], [0.0; 3])
    })
    .unwrap();
    let coeffs = StencilCoefficients::new(DT, g.cell_size());
    evolve_b(&mut f, &coeffs, Dimensionality::Three, Backend::Sequential);

    let scale = DT * k;
    for iv in g.domain().cells() {
        let x = g.node_position(iv)[0];
        let expected = DT * k * (k * x).cos();
        let got = f.by.get(iv);
        assert!(
            (got - expected).abs() <= REL_TOL * scale,
            "By at {iv:?}: got {got}, expected {expected}"
        );
        assert_eq!(f.bx.get(iv), 0.0);
        assert_eq!(f.bz.get(iv), 0.0);
    }
}

#[test]
fn ampere_3d_ex_from_bz_along_y() {
    let g = geometry([4, CELLS, 4], Dimensionality::Three);
    let k = wavenumber();
    let mut f = EmFields::from_fn(g.domain(), [1, 1, 1], |iv| {
        let y = g.node_position(iv)[1];
        ([0.0; 3], [0.0, 0.0, (k * y).sin()])
    })
    .unwrap();
    let j = CurrentDensity::zeros(g.domain(), [0, 0, 0]).unwrap();
    let coeffs = StencilCoefficients::new(DT, g.cell_size());
    evolve_e(&mut f, &j, &coeffs, Dimensionality::Three, Backend::Parallel);

    // dEx/dt = c^2 dBz/dy
    let scale = C * C * DT * k;
    for iv in g.domain().cells() {
        let y = g.node_position(iv)[1];
        let expected = C * C * DT * k * (k * y).cos();
        let got = f.ex.get(iv);
        assert!(
            (got - expected).abs() <= REL_TOL * scale,
            "Ex at {iv:?}: got {got}, expected {expected}"
        );
        assert_eq!(f.ez.get(iv), 0.0);
    }
}

// ---------------------------------------------------------------------------
// Reduced x-z stencil
// ---------------------------------------------------------------------------

#[test]
fn faraday_xz_bz_from_ey_along_x() {
    let g = geometry([CELLS, 1, 4], Dimensionality::XZ);
    let k = wavenumber();
    let mut f = EmFields::from_fn(g.domain(), [1, 0, 1], |iv| {
        let x = g.node_position(iv)[0];
        ([0.0, (k * x).sin(), 0.0], [0.0; 3])
    })
    .unwrap();
    let coeffs = StencilCoefficients::new(DT, g.cell_size());
    evolve_b(&mut f, &coeffs, Dimensionality::XZ, Backend::Sequential);

    // dBz/dt = -dEy/dx, dBx/dt = dEy/dz = 0
    let scale = DT * k;
    for iv in g.domain().cells() {
        let x = g.node_position(iv)[0];
        let expected = -DT * k * (k * x).cos();
        let got = f.bz.get(iv);
        assert!(
            (got - expected).abs() <= REL_TOL * scale,
            "Bz at {iv:?}: got {got}, expected {expected}"
        );
        assert_eq!(f.bx.get(iv), 0.0);
    }
}

#[test]
fn ampere_xz_ex_from_by_along_z() {
    let g = geometry([4, 1, CELLS], Dimensionality::XZ);
    let k = wavenumber();
    let mut f = EmFields::from_fn(g.domain(), [1, 0, 1], |iv| {
        let z = g.node_position(iv)[2];
        ([0.0; 3], [0.0, (k * z).sin(), 0.0])
    })
    .unwrap();
    let j = CurrentDensity::zeros(g.domain(), [0, 0, 0]).unwrap();
    let coeffs = StencilCoefficients::new(DT, g.cell_size());
    evolve_e(&mut f, &j, &coeffs, Dimensionality::XZ, Backend::Sequential);

    // dEx/dt = -c^2 dBy/dz
    let scale = C * C * DT * k;
    for iv in g.domain().cells() {
        let z = g.node_position(iv)[2];
        let expected = -C * C * DT * k * (k * z).cos();
        let got = f.ex.get(iv);
        assert!(
            (got - expected).abs() <= REL_TOL * scale,
            "Ex at {iv:?}: got {got}, expected {expected}"
        );
    }
}

// ---------------------------------------------------------------------------
// Backend equivalence
// ---------------------------------------------------------------------------

fn pseudo_random_fields(seed: u64, valid: IndexBox, ngrow: [i32; 3]) -> EmFields {
    let hash = |iv: [i32; 3], c: u64| {
        let mut h = seed ^ c.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        for v in iv {
            h = (h ^ v as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            h ^= h >> 31;
        }
        (h >> 11) as Real / (1u64 << 53) as Real - 0.5
    };
    EmFields::from_fn(valid, ngrow, |iv| {
        (
            [hash(iv, 0), hash(iv, 1), hash(iv, 2)],
            [hash(iv, 3), hash(iv, 4), hash(iv, 5)],
        )
    })
    .unwrap()
}

proptest! {
    #[test]
    fn backends_give_identical_fields(seed in any::<u64>(), xz in any::<bool>()) {
        let (extent, ngrow, dim) = if xz {
            ([6, 1, 5], [1, 0, 1], Dimensionality::XZ)
        } else {
            ([5, 4, 3], [1, 1, 1], Dimensionality::Three)
        };
        let valid = IndexBox::from_extent(extent).unwrap();
        let start = pseudo_random_fields(seed, valid, ngrow);
        let mut j = CurrentDensity::zeros(valid, [0, 0, 0]).unwrap();
        j.jy.fill(1e-3);
        let coeffs = StencilCoefficients::new(1e-12, [1e-3, 2e-3, 1.5e-3]);

        let mut results = Vec::new();
        for backend in Backend::ALL {
            let mut f = start.clone();
            evolve_b(&mut f, &coeffs, dim, backend);
            evolve_e(&mut f, &j, &coeffs, dim, backend);
            results.push(f);
        }
        prop_assert_eq!(&results[0], &results[1]);
    }
}
