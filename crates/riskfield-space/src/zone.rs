//! Axis-aligned zone primitives and soft-edged indicators.

use riskfield_core::OcclusionZone;

/// Closed axis-aligned rectangle `[x_min, x_max] x [y_min, y_max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Lower x bound.
    pub x_min: f64,
    /// Upper x bound.
    pub x_max: f64,
    /// Lower y bound.
    pub y_min: f64,
    /// Upper y bound.
    pub y_max: f64,
}

impl Rect {
    /// Rectangle of size `length x width` centred on `(cx, cy)`.
    pub fn centred(cx: f64, cy: f64, length: f64, width: f64) -> Self {
        let hl = 0.5 * length;
        let hw = 0.5 * width;
        Self {
            x_min: cx - hl,
            x_max: cx + hl,
            y_min: cy - hw,
            y_max: cy + hw,
        }
    }

    /// Whether two closed rectangles share at least one point.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.y_min <= other.y_max
            && other.y_min <= self.y_max
    }

    /// Euclidean distance from `(x, y)` to the rectangle; 0 inside.
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        let dx = (self.x_min - x).max(0.0).max(x - self.x_max);
        let dy = (self.y_min - y).max(0.0).max(y - self.y_max);
        dx.hypot(dy)
    }
}

impl From<&OcclusionZone> for Rect {
    fn from(z: &OcclusionZone) -> Self {
        Self {
            x_min: z.x_min,
            x_max: z.x_max,
            y_min: z.y_min,
            y_max: z.y_max,
        }
    }
}

/// Line segment between two world points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Start point.
    pub a: (f64, f64),
    /// End point.
    pub b: (f64, f64),
}

impl Segment {
    /// Segment from `a` to `b`.
    pub fn new(a: (f64, f64), b: (f64, f64)) -> Self {
        Self { a, b }
    }

    /// Euclidean distance from `(x, y)` to the closest point on the segment.
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        let (ax, ay) = self.a;
        let (bx, by) = self.b;
        let (ex, ey) = (bx - ax, by - ay);
        let len2 = ex * ex + ey * ey;
        let t = if len2 > 0.0 {
            (((x - ax) * ex + (y - ay) * ey) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let px = ax + t * ex;
        let py = ay + t * ey;
        (x - px).hypot(y - py)
    }
}

/// Raised-cosine falloff over a transition band of width `w`.
///
/// Returns 1 for `d <= 0`, `0.5 * (1 + cos(pi * d / w))` for `0 < d < w`,
/// and 0 beyond. Continuous with zero slope at both ends of the band. A
/// non-positive `w` gives a hard step.
pub fn cosine_falloff(d: f64, w: f64) -> f64 {
    if d <= 0.0 {
        1.0
    } else if w <= 0.0 || d >= w {
        0.0
    } else {
        0.5 * (1.0 + (std::f64::consts::PI * d / w).cos())
    }
}

/// Soft indicator of the interval `[a, b]`.
///
/// 1 inside; `exp(-d² / (2 w²))` at distance `d` outside.
pub fn soft_interval(v: f64, a: f64, b: f64, w: f64) -> f64 {
    let d = (a - v).max(0.0).max(v - b);
    if d <= 0.0 {
        1.0
    } else if w <= 0.0 {
        0.0
    } else {
        (-0.5 * d * d / (w * w)).exp()
    }
}
