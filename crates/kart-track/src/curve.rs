//! PathCurve: the track centre line.
//!
//! A centripetal Catmull-Rom spline through the control points. `point`
//! evaluates the raw spline parameter; `point_at` evaluates by normalised
//! arc length so equal steps in t cover equal distances on the road.

use glam::DVec3;
use thiserror::Error;

use kart_core::constants::{ARC_LENGTH_DIVISIONS, SPAWN_HEIGHT};
use kart_core::types::Position;

use crate::wrap_progress;

/// Minimum number of control points for a curve.
pub const MIN_CONTROL_POINTS: usize = 4;

/// Knot spacings below this are treated as coincident points.
const KNOT_EPSILON: f64 = 1e-4;

#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("curve needs at least 4 control points, got {0}")]
    TooFewPoints(usize),
    #[error("control point {0} is not finite")]
    NonFinitePoint(usize),
    #[error("curve has zero length")]
    ZeroLength,
}

/// Immutable spatial curve with an arc-length table.
#[derive(Debug, Clone)]
pub struct PathCurve {
    points: Vec<DVec3>,
    closed: bool,
    /// Cumulative length at `ARC_LENGTH_DIVISIONS + 1` evenly spaced raw parameters.
    arc_lengths: Vec<f64>,
}

impl PathCurve {
    /// Build a curve through `points`. A closed curve loops back to the first point.
    pub fn new(points: Vec<Position>, closed: bool) -> Result<Self, CurveError> {
        if points.len() < MIN_CONTROL_POINTS {
            return Err(CurveError::TooFewPoints(points.len()));
        }
        if let Some(idx) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(CurveError::NonFinitePoint(idx));
        }

        let mut curve = Self {
            points: points.into_iter().map(DVec3::from).collect(),
            closed,
            arc_lengths: Vec::new(),
        };
        curve.arc_lengths = curve.compute_arc_lengths(ARC_LENGTH_DIVISIONS);

        if curve.length() <= f64::EPSILON {
            return Err(CurveError::ZeroLength);
        }
        Ok(curve)
    }

    /// The default circuit: an eight-point loop on the ground plane.
    pub fn default_circuit() -> Self {
        let points = vec![
            Position::new(0.0, 0.0, 0.0),
            Position::new(50.0, 0.0, 0.0),
            Position::new(100.0, 0.0, 50.0),
            Position::new(100.0, 0.0, 100.0),
            Position::new(50.0, 0.0, 150.0),
            Position::new(0.0, 0.0, 150.0),
            Position::new(-50.0, 0.0, 100.0),
            Position::new(-50.0, 0.0, 50.0),
        ];
        Self::new(points, true).expect("default circuit control points are valid")
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn control_points(&self) -> impl Iterator<Item = Position> + '_ {
        self.points.iter().copied().map(Position::from)
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at normalised arc length `t`, wrapping into [0, 1).
    pub fn point_at(&self, t: f64) -> Position {
        Position::from(self.point_raw(self.arc_to_raw(wrap_progress(t))))
    }

    /// Point at raw spline parameter `u` in [0, 1].
    pub fn point(&self, u: f64) -> Position {
        Position::from(self.point_raw(u.clamp(0.0, 1.0)))
    }

    /// Start-line spawn point, shifted sideways by `offset` and lifted
    /// off the ground.
    pub fn spawn_point(&self, offset: f64) -> Position {
        let start = self.point_at(0.0);
        Position::new(start.x + offset, start.y + SPAWN_HEIGHT, start.z)
    }

    /// Unit tangent at normalised arc length `t` (finite difference).
    pub fn tangent_at(&self, t: f64) -> DVec3 {
        const H: f64 = 1e-4;
        let ahead = DVec3::from(self.point_at(t + H));
        let behind = DVec3::from(self.point_at(t - H));
        (ahead - behind).normalize_or_zero()
    }

    fn point_raw(&self, u: f64) -> DVec3 {
        let len = self.points.len();
        let segments = if self.closed { len } else { len - 1 };

        let p = segments as f64 * u;
        let mut int_point = p.floor() as isize;
        let mut weight = p - int_point as f64;

        if !self.closed && weight == 0.0 && int_point == len as isize - 1 {
            int_point = len as isize - 2;
            weight = 1.0;
        }

        let at = |i: isize| self.points[i.rem_euclid(len as isize) as usize];

        let p0 = if self.closed || int_point > 0 {
            at(int_point - 1)
        } else {
            // Extrapolate a virtual point before the first one.
            2.0 * self.points[0] - self.points[1]
        };
        let p1 = at(int_point);
        let p2 = at(int_point + 1);
        let p3 = if self.closed || int_point + 2 < len as isize {
            at(int_point + 2)
        } else {
            2.0 * self.points[len - 1] - self.points[len - 2]
        };

        centripetal_segment(p0, p1, p2, p3, weight)
    }

    fn compute_arc_lengths(&self, divisions: usize) -> Vec<f64> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = self.point_raw(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for i in 1..=divisions {
            let current = self.point_raw(i as f64 / divisions as f64);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }
        lengths
    }

    /// Map normalised arc length to the raw spline parameter.
    fn arc_to_raw(&self, t: f64) -> f64 {
        let lengths = &self.arc_lengths;
        let last = lengths.len() - 1;
        let target = t * self.length();

        // First index whose cumulative length reaches the target.
        let hi = lengths.partition_point(|&len| len < target);
        if hi == 0 {
            return 0.0;
        }
        if hi > last {
            return 1.0;
        }
        if lengths[hi] == target {
            return hi as f64 / last as f64;
        }

        let i = hi - 1;
        let before = lengths[i];
        let segment = lengths[hi] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };
        (i as f64 + fraction) / last as f64
    }
}

/// Evaluate one centripetal Catmull-Rom segment between `p1` and `p2`.
fn centripetal_segment(p0: DVec3, p1: DVec3, p2: DVec3, p3: DVec3, w: f64) -> DVec3 {
    // Knot spacing is |p_i+1 - p_i|^0.5, i.e. distance squared to the 1/4.
    let mut dt0 = p0.distance_squared(p1).powf(0.25);
    let mut dt1 = p1.distance_squared(p2).powf(0.25);
    let mut dt2 = p2.distance_squared(p3).powf(0.25);

    if dt1 < KNOT_EPSILON {
        dt1 = 1.0;
    }
    if dt0 < KNOT_EPSILON {
        dt0 = dt1;
    }
    if dt2 < KNOT_EPSILON {
        dt2 = dt1;
    }

    // Tangents at p1 and p2 for the non-uniform parameterisation,
    // rescaled to the [0, 1] segment parameter.
    let m1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
    let m2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

    // Cubic Hermite form.
    let c0 = p1;
    let c1 = m1;
    let c2 = -3.0 * p1 + 3.0 * p2 - 2.0 * m1 - m2;
    let c3 = 2.0 * p1 - 2.0 * p2 + m1 + m2;

    let w2 = w * w;
    c0 + c1 * w + c2 * w2 + c3 * w2 * w
}
