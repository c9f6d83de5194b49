//! Solver configuration and validation.
//!
//! [`RiskConfig`] is an immutable value handed to the solver constructor.
//! Every section has a `Default` carrying the reference merge-scenario
//! parameters. [`RiskConfig::validate`] checks structural invariants up
//! front so that coefficient and source construction can assume sane
//! inputs.

use crate::error::{Result, RiskError};

fn check_finite(name: &str, v: f64) -> Result<()> {
    if !v.is_finite() {
        return Err(RiskError::stale(format!("{name} must be finite, got {v}")));
    }
    Ok(())
}

fn check_non_negative(name: &str, v: f64) -> Result<()> {
    check_finite(name, v)?;
    if v < 0.0 {
        return Err(RiskError::stale(format!("{name} must be >= 0, got {v}")));
    }
    Ok(())
}

fn check_positive(name: &str, v: f64) -> Result<()> {
    check_finite(name, v)?;
    if v <= 0.0 {
        return Err(RiskError::stale(format!("{name} must be > 0, got {v}")));
    }
    Ok(())
}

// ── DomainConfig ───────────────────────────────────────────────────

/// World-frame rectangle and resolution of the simulation grid.
///
/// The grid is fixed in the world frame: vehicles travel through it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DomainConfig {
    /// Lower longitudinal bound in metres. Default: -30.
    pub x_min: f64,
    /// Upper longitudinal bound in metres. Default: 200.
    pub x_max: f64,
    /// Lower lateral bound in metres. Default: -15.
    pub y_min: f64,
    /// Upper lateral bound in metres. Default: 15.
    pub y_max: f64,
    /// Number of cells along x. Default: 150.
    pub nx: usize,
    /// Number of cells along y. Default: 70.
    pub ny: usize,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            x_min: -30.0,
            x_max: 200.0,
            y_min: -15.0,
            y_max: 15.0,
            nx: 150,
            ny: 70,
        }
    }
}

impl DomainConfig {
    /// Check the six grid scalars.
    ///
    /// # Errors
    ///
    /// [`RiskError::InvalidDomain`] if `nx < 2`, `ny < 2`, a bound is not
    /// finite, or an axis has non-positive extent.
    pub fn validate(&self) -> Result<()> {
        if self.nx < 2 || self.ny < 2 {
            return Err(RiskError::domain(format!(
                "grid needs at least 2 cells per axis, got nx={} ny={}",
                self.nx, self.ny
            )));
        }
        for (name, v) in [
            ("x_min", self.x_min),
            ("x_max", self.x_max),
            ("y_min", self.y_min),
            ("y_max", self.y_max),
        ] {
            if !v.is_finite() {
                return Err(RiskError::domain(format!("{name} must be finite, got {v}")));
            }
        }
        if self.x_max <= self.x_min {
            return Err(RiskError::domain(format!(
                "x_max ({}) must exceed x_min ({})",
                self.x_max, self.x_min
            )));
        }
        if self.y_max <= self.y_min {
            return Err(RiskError::domain(format!(
                "y_max ({}) must exceed y_min ({})",
                self.y_max, self.y_min
            )));
        }
        Ok(())
    }

    /// Whether the closed rectangle `[x0,x1] x [y0,y1]` overlaps the domain.
    pub fn overlaps(&self, x0: f64, x1: f64, y0: f64, y1: f64) -> bool {
        x0 <= self.x_max && x1 >= self.x_min && y0 <= self.y_max && y1 >= self.y_min
    }
}

// ── PdeParams ──────────────────────────────────────────────────────

/// Coefficients of the diffusion-decay-telegrapher equation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PdeParams {
    /// Base diffusion coefficient [m²/s]. Default: 1.0.
    pub d0: f64,
    /// Additional diffusion inside the occlusion zone [m²/s]. Default: 3.0.
    pub d_occ: f64,
    /// Base decay rate [1/s]. Default: 0.15.
    pub lambda_decay: f64,
    /// Length scale of the spatial decay falloff [m]. Default: 30.
    pub l_decay: f64,
    /// Extra decay where no recent vehicle activity was seen [1/s]. Default: 0.4.
    pub lambda_activity_boost: f64,
    /// Time constant of the per-vehicle activity memory [s]. Default: 2.5.
    pub tau_source_decay: f64,
    /// Width of the absorbing layer along each edge [m]. Default: 15.
    pub sponge_length: f64,
    /// Damping reached exactly at the domain boundary [1/s]. Default: 1.5.
    pub lambda_sponge: f64,
    /// Telegrapher relaxation time [s]; 0 disables inertia. Default: 0.
    pub tau: f64,
    /// Output smoothing sigma in grid cells; 0 disables it. Default: 0.
    pub post_smooth_sigma: f64,
}

impl Default for PdeParams {
    fn default() -> Self {
        Self {
            d0: 1.0,
            d_occ: 3.0,
            lambda_decay: 0.15,
            l_decay: 30.0,
            lambda_activity_boost: 0.4,
            tau_source_decay: 2.5,
            sponge_length: 15.0,
            lambda_sponge: 1.5,
            tau: 0.0,
            post_smooth_sigma: 0.0,
        }
    }
}

impl PdeParams {
    /// Check signs and finiteness of every coefficient.
    ///
    /// # Errors
    ///
    /// [`RiskError::StaleConfiguration`] naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        check_non_negative("d0", self.d0)?;
        check_non_negative("d_occ", self.d_occ)?;
        check_non_negative("lambda_decay", self.lambda_decay)?;
        check_positive("l_decay", self.l_decay)?;
        check_non_negative("lambda_activity_boost", self.lambda_activity_boost)?;
        check_positive("tau_source_decay", self.tau_source_decay)?;
        check_non_negative("sponge_length", self.sponge_length)?;
        check_non_negative("lambda_sponge", self.lambda_sponge)?;
        check_non_negative("tau", self.tau)?;
        check_non_negative("post_smooth_sigma", self.post_smooth_sigma)?;
        Ok(())
    }

    /// [`validate`](Self::validate), plus the checks that depend on the grid
    /// size: the smoothing sigma may not exceed the longer grid axis.
    ///
    /// # Errors
    ///
    /// [`RiskError::StaleConfiguration`] naming the first offending parameter.
    pub fn validate_for(&self, domain: &DomainConfig) -> Result<()> {
        self.validate()?;
        let cells = domain.nx.max(domain.ny) as f64;
        if self.post_smooth_sigma > cells {
            return Err(RiskError::stale(format!(
                "post_smooth_sigma must be <= {cells} cells, got {}",
                self.post_smooth_sigma
            )));
        }
        Ok(())
    }

    /// Whether the telegrapher (inertial) form is active.
    pub fn has_inertia(&self) -> bool {
        self.tau > 0.0
    }
}

// ── SourceParams ───────────────────────────────────────────────────

/// Kernel widths and gains of the vehicle and ambient source terms.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceParams {
    /// Longitudinal kernel spread [m]. Default: 12.
    pub sigma_x: f64,
    /// Lateral kernel spread [m]. Default: 3.
    pub sigma_y: f64,
    /// Persistent merge-topology gain. Default: 0.08.
    pub k_merge_ambient: f64,
    /// Vehicle gain inside the merge zone. Default: 0.6.
    pub k_merge_vehicle: f64,
    /// Ambient occlusion gain when the shadow is empty. Default: 0.05.
    pub k_occ_ambient: f64,
    /// Vehicle gain outside the merge zone. Default: 0.2.
    pub k_vehicle_base: f64,
    /// Activity level below which a cell counts as low-activity. Default: 0.05.
    pub activity_threshold: f64,
    /// Memory intensity below which an entry is evicted. Default: 1e-3.
    pub memory_eviction_threshold: f64,
}

impl Default for SourceParams {
    fn default() -> Self {
        Self {
            sigma_x: 12.0,
            sigma_y: 3.0,
            k_merge_ambient: 0.08,
            k_merge_vehicle: 0.6,
            k_occ_ambient: 0.05,
            k_vehicle_base: 0.2,
            activity_threshold: 0.05,
            memory_eviction_threshold: 1e-3,
        }
    }
}

impl SourceParams {
    /// Check kernel widths, gains and thresholds.
    ///
    /// # Errors
    ///
    /// [`RiskError::StaleConfiguration`] naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        check_positive("sigma_x", self.sigma_x)?;
        check_positive("sigma_y", self.sigma_y)?;
        check_non_negative("k_merge_ambient", self.k_merge_ambient)?;
        check_non_negative("k_merge_vehicle", self.k_merge_vehicle)?;
        check_non_negative("k_occ_ambient", self.k_occ_ambient)?;
        if self.k_occ_ambient > 1.0 {
            return Err(RiskError::stale(format!(
                "k_occ_ambient gates vehicle risk and must be <= 1, got {}",
                self.k_occ_ambient
            )));
        }
        check_non_negative("k_vehicle_base", self.k_vehicle_base)?;
        check_non_negative("activity_threshold", self.activity_threshold)?;
        check_positive("memory_eviction_threshold", self.memory_eviction_threshold)?;
        if self.memory_eviction_threshold >= 1.0 {
            return Err(RiskError::stale(format!(
                "memory_eviction_threshold must be < 1 (peak intensity), got {}",
                self.memory_eviction_threshold
            )));
        }
        Ok(())
    }
}

// ── RoadGeometry ───────────────────────────────────────────────────

/// Rectangular occlusion shadow behind a static obstruction.
///
/// Vehicles whose footprint overlaps this rectangle are considered to be
/// in the shadow.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OcclusionZone {
    /// Lower longitudinal bound [m]. Default: 10.
    pub x_min: f64,
    /// Upper longitudinal bound [m]. Default: 30.
    pub x_max: f64,
    /// Lower lateral bound [m]. Default: 4.
    pub y_min: f64,
    /// Upper lateral bound [m]. Default: 10.
    pub y_max: f64,
}

impl Default for OcclusionZone {
    fn default() -> Self {
        Self {
            x_min: 10.0,
            x_max: 30.0,
            y_min: 4.0,
            y_max: 10.0,
        }
    }
}

/// Static road topology: merge zone, lanes and occlusion shadow.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadGeometry {
    /// Start of the merge zone [m]. Default: 30.
    pub merge_x_start: f64,
    /// End of the merge zone (gore point) [m]. Default: 70.
    pub merge_x_end: f64,
    /// Lateral position of the ramp lane [m]. Default: 6.
    pub merge_y_ramp: f64,
    /// Lane width [m]. Default: 4.
    pub lane_width: f64,
    /// Lateral lane centre positions [m]. Default: `[-4, 0, 4, 8]`.
    pub lane_centers: Vec<f64>,
    /// Occlusion shadow.
    pub occlusion: OcclusionZone,
}

impl Default for RoadGeometry {
    fn default() -> Self {
        Self {
            merge_x_start: 30.0,
            merge_x_end: 70.0,
            merge_y_ramp: 6.0,
            lane_width: 4.0,
            lane_centers: vec![-4.0, 0.0, 4.0, 8.0],
            occlusion: OcclusionZone::default(),
        }
    }
}

impl RoadGeometry {
    /// Check the geometry against the grid rectangle it will be rasterised on.
    ///
    /// # Errors
    ///
    /// [`RiskError::StaleConfiguration`] if a bound is not finite, the merge
    /// or occlusion interval is inverted, either zone lies entirely outside
    /// the domain, the ramp is outside the lateral extent, or no lanes are
    /// defined.
    pub fn validate(&self, domain: &DomainConfig) -> Result<()> {
        check_finite("merge_x_start", self.merge_x_start)?;
        check_finite("merge_x_end", self.merge_x_end)?;
        check_finite("merge_y_ramp", self.merge_y_ramp)?;
        check_positive("lane_width", self.lane_width)?;
        if self.merge_x_end <= self.merge_x_start {
            return Err(RiskError::stale(format!(
                "merge_x_end ({}) must exceed merge_x_start ({})",
                self.merge_x_end, self.merge_x_start
            )));
        }
        if !domain.overlaps(
            self.merge_x_start,
            self.merge_x_end,
            self.merge_y_ramp,
            self.merge_y_ramp,
        ) {
            return Err(RiskError::stale(format!(
                "merge zone [{}, {}] at y={} lies outside the grid",
                self.merge_x_start, self.merge_x_end, self.merge_y_ramp
            )));
        }
        if self.lane_centers.is_empty() {
            return Err(RiskError::stale("lane_centers must not be empty"));
        }
        for (i, &c) in self.lane_centers.iter().enumerate() {
            check_finite(&format!("lane_centers[{i}]"), c)?;
        }

        let occ = &self.occlusion;
        for (name, v) in [
            ("occlusion.x_min", occ.x_min),
            ("occlusion.x_max", occ.x_max),
            ("occlusion.y_min", occ.y_min),
            ("occlusion.y_max", occ.y_max),
        ] {
            check_finite(name, v)?;
        }
        if occ.x_max <= occ.x_min || occ.y_max <= occ.y_min {
            return Err(RiskError::stale(format!(
                "occlusion zone [{}, {}] x [{}, {}] is degenerate",
                occ.x_min, occ.x_max, occ.y_min, occ.y_max
            )));
        }
        if !domain.overlaps(occ.x_min, occ.x_max, occ.y_min, occ.y_max) {
            return Err(RiskError::stale(format!(
                "occlusion zone [{}, {}] x [{}, {}] lies outside the grid",
                occ.x_min, occ.x_max, occ.y_min, occ.y_max
            )));
        }
        Ok(())
    }

    /// Whether `(x, y)` lies in the merge conflict zone.
    ///
    /// The zone spans `[merge_x_start, merge_x_end]` longitudinally and one
    /// lane width either side of the ramp laterally.
    pub fn in_merge_zone(&self, x: f64, y: f64) -> bool {
        x >= self.merge_x_start
            && x <= self.merge_x_end
            && (y - self.merge_y_ramp).abs() <= self.lane_width
    }
}

// ── VehicleDimensions ──────────────────────────────────────────────

/// Nominal footprint of each vehicle class.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleDimensions {
    /// Car length [m]. Default: 5.
    pub car_length: f64,
    /// Car width [m]. Default: 2.
    pub car_width: f64,
    /// Truck length [m]. Default: 12.
    pub truck_length: f64,
    /// Truck width [m]. Default: 2.5.
    pub truck_width: f64,
}

impl Default for VehicleDimensions {
    fn default() -> Self {
        Self {
            car_length: 5.0,
            car_width: 2.0,
            truck_length: 12.0,
            truck_width: 2.5,
        }
    }
}

impl VehicleDimensions {
    /// Check that every dimension is strictly positive.
    ///
    /// # Errors
    ///
    /// [`RiskError::StaleConfiguration`] naming the offending dimension.
    pub fn validate(&self) -> Result<()> {
        check_positive("car_length", self.car_length)?;
        check_positive("car_width", self.car_width)?;
        check_positive("truck_length", self.truck_length)?;
        check_positive("truck_width", self.truck_width)?;
        Ok(())
    }
}

// ── RiskConfig ─────────────────────────────────────────────────────

/// Complete solver configuration.
///
/// Passed by value into the solver; there is no global or shared
/// configuration state, so independent solver instances never interact.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskConfig {
    /// Grid rectangle and resolution.
    pub domain: DomainConfig,
    /// PDE coefficients.
    pub pde: PdeParams,
    /// Source kernel parameters.
    pub source: SourceParams,
    /// Road topology.
    pub geometry: RoadGeometry,
    /// Vehicle footprints.
    pub vehicles: VehicleDimensions,
}

impl RiskConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// [`RiskError::InvalidDomain`] for grid problems, otherwise
    /// [`RiskError::StaleConfiguration`].
    pub fn validate(&self) -> Result<()> {
        self.domain.validate()?;
        self.pde.validate_for(&self.domain)?;
        self.source.validate()?;
        self.geometry.validate(&self.domain)?;
        self.vehicles.validate()?;
        Ok(())
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn config_survives_json() {
        let mut config = RiskConfig::default();
        config.pde.tau = 0.3;
        config.domain.nx = 60;
        config.geometry.lane_centers.push(10.5);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"post_smooth_sigma\""), "{json}");
        let back: RiskConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        back.validate().unwrap();
    }

    #[test]
    fn missing_section_is_rejected() {
        let err = serde_json::from_str::<RiskConfig>(r#"{"domain": {}}"#).unwrap_err();
        assert!(err.is_data(), "{err}");
    }
}
