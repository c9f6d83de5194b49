//! Reference merge scenario: one truck on the ramp for five seconds.

use riskfield_engine::RiskFieldSolver;
use riskfield_test_utils::{edge_max, reference_config, truck_at};

#[test]
fn truck_on_ramp_produces_localised_peak() {
    let config = reference_config();
    let mut solver = RiskFieldSolver::new(config.clone()).unwrap();
    let obs = [truck_at(1, 50.0, 6.0)];
    let mut substeps = 0;
    for _ in 0..100 {
        let m = solver.step(&obs, 0.05).unwrap();
        assert_eq!(m.accepted_observations, 1);
        assert_eq!(m.dropped_observations, 0);
        substeps = m.substeps;
    }
    assert_eq!(substeps, 3);
    assert!((solver.time() - 5.0).abs() < 1e-9);

    let snap = solver.snapshot();
    let (px, py, peak) = snap.peak();
    let grid = snap.grid();
    assert!((px - 50.0).abs() <= 2.0 * grid.dx(), "peak x = {px}");
    // The sponge gradient pulls the peak toward the centreline.
    assert!((py - 6.0).abs() <= 2.0, "peak y = {py}");

    // Bounded above by the source integrated over five seconds.
    let amplitude = config.source.k_merge_vehicle + config.source.k_merge_ambient;
    assert!(peak > config.source.k_merge_vehicle, "peak = {peak}");
    assert!(peak < amplitude * 5.0, "peak = {peak}");

    let downstream = snap
        .lane_profile(6.0)
        .iter()
        .zip(grid.x())
        .filter(|(_, &x)| x >= 110.0)
        .map(|(&v, _)| v)
        .fold(0.0, f64::max);
    assert!(downstream < 0.05 * peak, "risk at x>=110 is {downstream}");
    assert!(snap.value_at(110.0, 6.0) < 0.05 * peak);

    let edge = edge_max(grid, snap.values());
    assert!(edge < 0.05 * peak, "edge {edge} vs peak {peak}");
    assert!(snap.values().iter().all(|v| v.is_finite() && *v >= 0.0));
}

#[test]
fn peak_moves_with_the_vehicle() {
    let mut solver = RiskFieldSolver::new(reference_config()).unwrap();
    let mut x = 20.0;
    for _ in 0..60 {
        x += 25.0 * 0.05;
        solver.step(&[truck_at(9, x, 0.0)], 0.05).unwrap();
    }
    let (px, _, _) = solver.snapshot().peak();
    assert!(px > 50.0 && px <= x + 1.0, "peak at {px}, truck at {x}");
}
