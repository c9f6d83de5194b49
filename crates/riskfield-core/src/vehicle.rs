//! Vehicle observations consumed by the solver each tick.

use std::fmt;
use std::str::FromStr;

use crate::config::VehicleDimensions;
use crate::error::{Result, RiskError};
use crate::id::VehicleId;

/// Vehicle class reported by the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VehicleClass {
    /// Passenger car.
    Car,
    /// Heavy goods vehicle.
    Truck,
}

impl VehicleClass {
    /// Footprint `(length, width)` in metres for this class.
    pub fn extent(self, dims: &VehicleDimensions) -> (f64, f64) {
        match self {
            Self::Car => (dims.car_length, dims.car_width),
            Self::Truck => (dims.truck_length, dims.truck_width),
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Car => write!(f, "car"),
            Self::Truck => write!(f, "truck"),
        }
    }
}

impl FromStr for VehicleClass {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(Self::Car),
            "truck" => Ok(Self::Truck),
            other => Err(format!("unknown vehicle class '{other}'")),
        }
    }
}

/// One vehicle as seen by the tracker at the current tick.
///
/// Positions are in the world frame, in metres. Observations live for a
/// single tick; nothing in the solver retains them beyond the activity
/// memory entry keyed by [`id`](VehicleObservation::id).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleObservation {
    /// Tracker identifier.
    pub id: VehicleId,
    /// Longitudinal position.
    pub x: f64,
    /// Lateral position.
    pub y: f64,
    /// Vehicle class, which determines the footprint.
    pub class: VehicleClass,
}

impl VehicleObservation {
    /// Create an observation from already-typed values.
    pub fn new(id: impl Into<VehicleId>, x: f64, y: f64, class: VehicleClass) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            class,
        }
    }

    /// Build an observation from a raw tracker record with a textual class.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::InvalidVehicleObservation`] if the class label is
    /// not `car` or `truck`, or if the position is not finite.
    pub fn parse(id: impl Into<VehicleId>, x: f64, y: f64, class_label: &str) -> Result<Self> {
        let id = id.into();
        let class = class_label
            .parse::<VehicleClass>()
            .map_err(|reason| RiskError::observation(id, reason))?;
        let obs = Self { id, x, y, class };
        obs.validate()?;
        Ok(obs)
    }

    /// Check that the observation can be rasterised.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::InvalidVehicleObservation`] for a NaN or
    /// infinite coordinate.
    pub fn validate(&self) -> Result<()> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(RiskError::observation(
                self.id,
                format!("position must be finite, got ({}, {})", self.x, self.y),
            ));
        }
        Ok(())
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn observation_survives_json() {
        let obs = VehicleObservation::new(7u64, 50.25, -3.5, VehicleClass::Truck);
        let json = serde_json::to_string(&obs).unwrap();
        assert_eq!(json, r#"{"id":7,"x":50.25,"y":-3.5,"class":"truck"}"#);
        let back: VehicleObservation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obs);
    }

    #[test]
    fn class_labels_are_lowercase() {
        let car: VehicleClass = serde_json::from_str(r#""car""#).unwrap();
        assert_eq!(car, VehicleClass::Car);
        assert!(serde_json::from_str::<VehicleClass>(r#""Truck""#).is_err());
    }
}
