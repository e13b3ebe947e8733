//! Variable-width brush outlines.
//!
//! Turns a sequence of pressure-carrying samples into a closed polygon whose
//! thickness follows the pressure profile. Everything runs in document units.

use crate::stroke::InkPoint;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Slightly larger than π so that the half-turn cap loops close cleanly.
const FIXED_PI: f64 = std::f64::consts::PI + 0.0001;

/// How quickly simulated pressure follows speed changes.
const RATE_OF_PRESSURE_CHANGE: f64 = 0.275;

/// Samples closer than this to the end of the stroke are skipped, except the last.
const END_NOISE_LENGTH: f64 = 3.0;

/// Easing curve applied to pressure before computing the radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Easing {
    Linear,
    #[default]
    Sqrt,
}

impl Easing {
    fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::Sqrt => t.max(0.0).sqrt(),
        }
    }
}

/// Shape parameters for [`smooth`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeOptions {
    /// Base diameter of the brush.
    pub size: f64,
    /// How much pressure narrows the stroke (0 = constant width).
    pub thinning: f64,
    /// Minimum spacing between outline points, as a fraction of `size`.
    pub smoothing: f64,
    /// How strongly raw samples are pulled toward the previous one.
    pub streamline: f64,
    /// Pressure easing curve.
    pub easing: Easing,
    /// Derive pressure from sample spacing instead of reported values.
    pub simulate_pressure: bool,
    /// Whether the final sample is the end of the gesture.
    pub last: bool,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self {
            size: 8.0,
            thinning: 0.7,
            smoothing: 0.5,
            streamline: 0.5,
            easing: Easing::Sqrt,
            simulate_pressure: false,
            last: false,
        }
    }
}

impl StrokeOptions {
    /// Same profile with a different brush size.
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    fn radius(&self, pressure: f64) -> f64 {
        self.size * self.easing.apply(0.5 - self.thinning * (0.5 - pressure))
    }
}

/// A streamlined sample with its running geometry.
#[derive(Debug, Clone, Copy)]
struct StrokeSample {
    point: Point,
    pressure: f64,
    /// Unit vector pointing back toward the previous sample.
    vector: Vec2,
    distance: f64,
    running_length: f64,
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    a + (b - a) * t
}

fn unit(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len == 0.0 { Vec2::ZERO } else { v / len }
}

/// Perpendicular, rotated a quarter turn clockwise.
fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

fn rotate_around(p: Point, center: Point, angle: f64) -> Point {
    let (s, c) = angle.sin_cos();
    let d = p - center;
    Point::new(d.x * c - d.y * s + center.x, d.x * s + d.y * c + center.y)
}

fn stroke_samples(points: &[InkPoint], options: &StrokeOptions) -> Vec<StrokeSample> {
    let t = 0.15 + (1.0 - options.streamline) * 0.85;

    let mut pts: Vec<InkPoint> = points.to_vec();
    if pts.len() == 2 {
        // Two samples give no curvature; interpolate so caps have direction.
        let last = pts[1];
        let first = pts[0];
        pts.truncate(1);
        for i in 1..5 {
            let f = f64::from(i) / 4.0;
            let p = lerp(first.position(), last.position(), f);
            pts.push(InkPoint::new(
                p.x,
                p.y,
                first.pressure + (last.pressure - first.pressure) * f,
            ));
        }
    }

    let first = pts[0];
    let mut samples = vec![StrokeSample {
        point: first.position(),
        pressure: first.pressure,
        vector: Vec2::new(1.0, 1.0),
        distance: 0.0,
        running_length: 0.0,
    }];

    let mut reached_minimum_length = false;
    let mut running_length = 0.0;
    let max = pts.len() - 1;

    for (i, raw) in pts.iter().enumerate().skip(1) {
        let prev = samples[samples.len() - 1];
        let point = if options.last && i == max {
            raw.position()
        } else {
            lerp(prev.point, raw.position(), t)
        };
        if point == prev.point {
            continue;
        }

        let distance = point.distance(prev.point);
        running_length += distance;

        if i < max && !reached_minimum_length {
            if running_length < options.size {
                continue;
            }
            reached_minimum_length = true;
        }

        samples.push(StrokeSample {
            point,
            pressure: raw.pressure,
            vector: unit(prev.point - point),
            distance,
            running_length,
        });
    }

    samples[0].vector = samples.get(1).map(|s| s.vector).unwrap_or(Vec2::ZERO);
    samples
}

fn simulated_pressure(previous: f64, distance: f64, size: f64) -> f64 {
    let sp = (distance / size).min(1.0);
    let rp = (1.0 - sp).min(1.0);
    (previous + (rp - previous) * (sp * RATE_OF_PRESSURE_CHANGE)).min(1.0)
}

/// Build the closed outline polygon for a stroke.
///
/// Fewer than two samples produce an empty outline, as does a non-positive size.
pub fn smooth(points: &[InkPoint], options: &StrokeOptions) -> Vec<Point> {
    if points.len() < 2 || options.size <= 0.0 {
        return Vec::new();
    }

    let samples = stroke_samples(points, options);
    if samples.len() < 2 {
        return Vec::new();
    }

    let last_index = samples.len() - 1;
    let total_length = samples[last_index].running_length;
    let min_distance = (options.size * options.smoothing).powi(2);

    let mut left: Vec<Point> = Vec::new();
    let mut right: Vec<Point> = Vec::new();

    let mut prev_pressure = samples.iter().take(10).fold(samples[0].pressure, |acc, s| {
        let pressure = if options.simulate_pressure {
            simulated_pressure(acc, s.distance, options.size)
        } else {
            s.pressure
        };
        (acc + pressure) / 2.0
    });

    let mut radius = options.radius(samples[last_index].pressure);
    let mut prev_vector = samples[0].vector;
    let mut pl = samples[0].point;
    let mut pr = pl;
    let mut tl = pl;
    let mut tr = pr;
    let mut prev_sharp = false;

    for (i, sample) in samples.iter().enumerate() {
        if i < last_index && total_length - sample.running_length < END_NOISE_LENGTH {
            continue;
        }

        radius = if options.thinning != 0.0 {
            let pressure = if options.simulate_pressure {
                simulated_pressure(prev_pressure, sample.distance, options.size)
            } else {
                sample.pressure
            };
            prev_pressure = pressure;
            options.radius(pressure)
        } else {
            options.size / 2.0
        };
        radius = radius.max(0.01);

        let next_vector = samples.get(i + 1).unwrap_or(sample).vector;
        let next_dot = if i < last_index {
            sample.vector.dot(next_vector)
        } else {
            1.0
        };
        let prev_dot = sample.vector.dot(prev_vector);

        let is_sharp = prev_dot < 0.0 && !prev_sharp;
        let next_sharp = next_dot < 0.0;

        if is_sharp || next_sharp {
            // Round the corner with a half turn on both sides.
            let offset = perpendicular(prev_vector) * radius;
            let step = 1.0 / 13.0;
            let mut t = 0.0;
            while t <= 1.0 {
                tl = rotate_around(sample.point - offset, sample.point, FIXED_PI * t);
                left.push(tl);
                tr = rotate_around(sample.point + offset, sample.point, FIXED_PI * -t);
                right.push(tr);
                t += step;
            }
            pl = tl;
            pr = tr;
            if next_sharp {
                prev_sharp = true;
            }
            continue;
        }

        prev_sharp = false;

        if i == last_index {
            let offset = perpendicular(sample.vector) * radius;
            left.push(sample.point - offset);
            right.push(sample.point + offset);
            continue;
        }

        let blended = next_vector.lerp(sample.vector, next_dot);
        let offset = perpendicular(blended) * radius;

        tl = sample.point - offset;
        if i <= 1 || (pl - tl).hypot2() > min_distance {
            left.push(tl);
            pl = tl;
        }

        tr = sample.point + offset;
        if i <= 1 || (pr - tr).hypot2() > min_distance {
            right.push(tr);
            pr = tr;
        }

        prev_vector = sample.vector;
    }

    if left.is_empty() || right.is_empty() {
        return Vec::new();
    }

    let first_point = samples[0].point;
    let last_point = samples[last_index].point;

    let start_cap: Vec<Point> = cap_steps(13, 1.0)
        .map(|t| rotate_around(right[0], first_point, FIXED_PI * t))
        .collect();

    let direction = perpendicular(-samples[last_index].vector);
    let end_start = last_point + direction * radius;
    let end_cap: Vec<Point> = cap_steps(29, 1.0 - f64::EPSILON)
        .map(|t| rotate_around(end_start, last_point, FIXED_PI * 3.0 * t))
        .collect();

    let mut outline = left;
    outline.extend(end_cap);
    outline.extend(right.into_iter().rev());
    outline.extend(start_cap);
    outline
}

/// Fractions `1/n, 2/n, ...` up to `upper` inclusive.
fn cap_steps(n: u32, upper: f64) -> impl Iterator<Item = f64> {
    let step = 1.0 / f64::from(n);
    (1..=n).map(move |i| f64::from(i) * step).filter(move |t| *t <= upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, pressure: f64) -> Vec<InkPoint> {
        (0..n)
            .map(|i| InkPoint::new(i as f64 * 10.0, 0.0, pressure))
            .collect()
    }

    #[test]
    fn test_degenerate_input_is_empty() {
        let options = StrokeOptions::default();
        assert!(smooth(&[], &options).is_empty());
        assert!(smooth(&[InkPoint::new(1.0, 1.0, 0.5)], &options).is_empty());
    }

    #[test]
    fn test_zero_size_is_empty() {
        let options = StrokeOptions::default().with_size(0.0);
        assert!(smooth(&line(5, 0.5), &options).is_empty());
    }

    #[test]
    fn test_outline_surrounds_samples() {
        let options = StrokeOptions::default().with_size(8.0);
        let outline = smooth(&line(12, 0.5), &options);
        assert!(outline.len() >= 3);

        let (mut min_y, mut max_y) = (f64::MAX, f64::MIN);
        for p in &outline {
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        assert!(min_y < 0.0);
        assert!(max_y > 0.0);
        // Half pressure through the sqrt easing gives a radius of size * sqrt(0.5).
        let radius = options.size * 0.5_f64.sqrt();
        assert!(max_y - min_y <= 2.0 * radius + 1e-6);
    }

    #[test]
    fn test_two_points_still_produce_outline() {
        let points = vec![InkPoint::new(0.0, 0.0, 0.5), InkPoint::new(40.0, 0.0, 0.5)];
        let outline = smooth(&points, &StrokeOptions::default());
        assert!(outline.len() >= 3);
    }

    #[test]
    fn test_deterministic() {
        let points = vec![
            InkPoint::new(0.0, 0.0, 0.3),
            InkPoint::new(15.0, 4.0, 0.6),
            InkPoint::new(30.0, 12.0, 0.8),
            InkPoint::new(50.0, 9.0, 0.4),
        ];
        let options = StrokeOptions::default();
        assert_eq!(smooth(&points, &options), smooth(&points, &options));
    }

    #[test]
    fn test_pressure_widens_stroke() {
        let options = StrokeOptions::default().with_size(10.0);
        let height = |outline: &[Point]| {
            let max = outline.iter().map(|p| p.y).fold(f64::MIN, f64::max);
            let min = outline.iter().map(|p| p.y).fold(f64::MAX, f64::min);
            max - min
        };
        let light = smooth(&line(12, 0.1), &options);
        let heavy = smooth(&line(12, 1.0), &options);
        assert!(height(&heavy) > height(&light));
    }
}
