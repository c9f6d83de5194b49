//! Properties of the explicit integrator on small grids.

use proptest::prelude::*;
use riskfield_core::{DomainConfig, PdeParams, RoadGeometry};
use riskfield_pde::{CoefficientFields, FieldIntegrator, RiskState, SourceField};
use riskfield_space::Grid;
use riskfield_test_utils::{field_mass, max_abs_diff, reference_grid};

fn coarse_grid() -> Grid {
    Grid::from_domain(&DomainConfig {
        nx: 40,
        ny: 20,
        ..DomainConfig::default()
    })
    .unwrap()
}

fn build(grid: &Grid, pde: &PdeParams) -> CoefficientFields {
    CoefficientFields::build(grid, &RoadGeometry::default(), pde).unwrap()
}

#[test]
fn subdivision_matches_manual_substeps() {
    for tau in [0.0, 0.3] {
        let pde = PdeParams {
            tau,
            ..PdeParams::default()
        };
        let grid = reference_grid();
        let coeffs = build(&grid, &pde);
        let mut sources = SourceField::zeros(&grid);
        let c = grid.flat_index_of(50.0, 6.0);
        sources.intensity[c] = 2.0;
        sources.activity_boost.fill(0.4);

        let dt = 0.5;
        let mut integ = FieldIntegrator::new(&grid, tau);
        let n = integ.substeps_for(&grid, &coeffs, &sources, dt);
        assert!(n > 1, "dt={dt} should need sub-steps, got {n}");

        let mut internal = RiskState::zeros(&grid, tau > 0.0);
        let stats = integ
            .advance(&grid, &coeffs, &sources, &mut internal, dt)
            .unwrap();
        assert_eq!(stats.substeps, n);

        let mut manual = RiskState::zeros(&grid, tau > 0.0);
        let mut raw = FieldIntegrator::new(&grid, tau);
        for _ in 0..n {
            raw.substep(&grid, &coeffs, &sources, &mut manual, dt / n as f64)
                .unwrap();
        }
        let diff = max_abs_diff(&internal.risk, &manual.risk);
        assert!(diff < 1e-12, "tau={tau}: diff {diff}");
        assert!(internal.risk[c] > 0.0);
    }
}

#[test]
fn oversized_single_step_would_blow_up() {
    let pde = PdeParams::default();
    let grid = coarse_grid();
    let coeffs = build(&grid, &pde);
    let mut sources = SourceField::zeros(&grid);
    sources.intensity[grid.flat_index_of(50.0, 6.0)] = 1.0;

    let mut integ = FieldIntegrator::new(&grid, 0.0);
    let mut safe = RiskState::zeros(&grid, false);
    let mut unsafe_state = RiskState::zeros(&grid, false);
    for _ in 0..200 {
        integ
            .advance(&grid, &coeffs, &sources, &mut safe, 1.0)
            .unwrap();
        let _ = integ.substep(&grid, &coeffs, &sources, &mut unsafe_state, 1.0);
    }
    assert!(safe.risk.iter().all(|r| r.is_finite() && *r >= 0.0));
    let wild = unsafe_state
        .risk
        .iter()
        .any(|r| !r.is_finite() || r.abs() > 1e6);
    assert!(wild, "an unsubdivided step far past the limit should diverge");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn zero_source_never_gains_mass(
        d0 in 0.0f64..5.0,
        d_occ in 0.0f64..5.0,
        lambda_decay in 0.01f64..1.0,
        seed_cells in prop::collection::vec((0usize..800, 0.0f64..10.0), 1..20),
        dt in 0.01f64..0.5,
    ) {
        let pde = PdeParams { d0, d_occ, lambda_decay, ..PdeParams::default() };
        let grid = coarse_grid();
        let coeffs = build(&grid, &pde);
        let sources = SourceField::zeros(&grid);
        let mut state = RiskState::zeros(&grid, false);
        for (i, v) in seed_cells {
            state.risk[i] = v;
        }
        let mut integ = FieldIntegrator::new(&grid, 0.0);
        let mut prev = field_mass(&grid, &state.risk);
        for _ in 0..10 {
            integ.advance(&grid, &coeffs, &sources, &mut state, dt).unwrap();
            let mass = field_mass(&grid, &state.risk);
            prop_assert!(mass <= prev * (1.0 + 1e-12) + 1e-12, "mass grew {prev} -> {mass}");
            prop_assert!(state.risk.iter().all(|&r| r >= 0.0));
            prev = mass;
        }
    }
}
