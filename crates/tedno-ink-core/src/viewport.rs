//! Viewport module for pan/zoom transforms.
//!
//! Screen positions are relative to the drawing surface's top-left corner;
//! `screen = document * zoom + pan`.

use crate::config::ConfigError;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Frame interval assumed when two pan samples share a timestamp.
const FALLBACK_SAMPLE_MS: f64 = 16.0;

/// Rubber-band damping for pan offsets beyond a soft limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resistance {
    /// Offsets up to this magnitude pass through unchanged.
    pub limit: f64,
    /// Fraction of the excess beyond `limit` that is kept.
    pub factor: f64,
}

impl Default for Resistance {
    fn default() -> Self {
        Self {
            limit: 250.0,
            factor: 0.3,
        }
    }
}

impl Resistance {
    /// Damp one axis.
    pub fn apply(&self, value: f64) -> f64 {
        if value.abs() <= self.limit {
            return value;
        }
        let resisted = self.limit + (value.abs() - self.limit) * self.factor;
        resisted.copysign(value)
    }

    /// Find the undamped offset that `apply` maps to `value`.
    pub fn invert(&self, value: f64) -> f64 {
        if value.abs() <= self.limit || self.factor <= 0.0 {
            return value;
        }
        let raw = self.limit + (value.abs() - self.limit) / self.factor;
        raw.copysign(value)
    }
}

/// Tuning values for the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Velocity multiplier applied every momentum frame.
    pub friction: f64,
    /// Momentum stops once both axis velocities (px/ms) fall below this.
    pub momentum_epsilon: f64,
    /// Duration of one animation frame in milliseconds.
    pub frame_ms: f64,
    /// Pan rubber-banding, `None` for a free pan.
    pub resistance: Option<Resistance>,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 5.0,
            friction: 0.94,
            momentum_epsilon: 0.01,
            frame_ms: 16.0,
            resistance: Some(Resistance::default()),
        }
    }
}

impl ViewportConfig {
    /// Check that zoom bounds include 1 and that momentum always settles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_zoom > 0.0 && self.min_zoom <= 1.0 && self.max_zoom >= 1.0) {
            return Err(ConfigError::ZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        let checks = [
            ("viewport.friction", self.friction, (0.0..1.0).contains(&self.friction)),
            ("viewport.momentum_epsilon", self.momentum_epsilon, self.momentum_epsilon > 0.0),
            ("viewport.frame_ms", self.frame_ms, self.frame_ms > 0.0),
        ];
        for (field, value, ok) in checks {
            if !ok {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if let Some(r) = self.resistance {
            if !(r.limit >= 0.0) {
                return Err(ConfigError::OutOfRange {
                    field: "viewport.resistance.limit",
                    value: r.limit,
                });
            }
            if !(r.factor > 0.0 && r.factor <= 1.0) {
                return Err(ConfigError::OutOfRange {
                    field: "viewport.resistance.factor",
                    value: r.factor,
                });
            }
        }
        Ok(())
    }
}

/// State captured when a pinch starts.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PinchAnchor {
    distance: f64,
    zoom: f64,
    pan: Vec2,
    centroid: Point,
}

/// State of an active single-finger pan.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PanAnchor {
    /// Touch position minus pan offset at gesture start.
    anchor: Vec2,
    /// Unresisted offset of the last sample, for velocity.
    last_offset: Vec2,
    last_time: Instant,
    /// Pan velocity in px/ms.
    velocity: Vec2,
}

/// Owns the zoom scale and pan offset of one drawing surface.
#[derive(Debug, Clone)]
pub struct Viewport {
    /// Current translation offset (pan).
    pub pan: Vec2,
    /// Current zoom level.
    pub zoom: f64,
    config: ViewportConfig,
    pinch: Option<PinchAnchor>,
    pan_gesture: Option<PanAnchor>,
    /// Velocity of the running momentum animation, if any.
    momentum: Option<Vec2>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::with_config(ViewportConfig::default())
    }
}

impl Viewport {
    /// Create a viewport at zoom 1 with no pan.
    pub fn new(config: ViewportConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: ViewportConfig) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            config,
            pinch: None,
            pan_gesture: None,
            momentum: None,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Get the affine transform for rendering (document → screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    /// Get the inverse transform for input handling (screen → document).
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.pan)
    }

    /// Convert a screen point to document coordinates.
    pub fn screen_to_document(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a document point to screen coordinates.
    pub fn document_to_screen(&self, document_point: Point) -> Point {
        self.transform() * document_point
    }

    /// Whether single-finger touches should pan rather than draw.
    pub fn is_zoomed(&self) -> bool {
        self.zoom > 1.0
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.config.min_zoom, self.config.max_zoom)
    }

    /// Start a two-finger pinch.
    pub fn begin_pinch(&mut self, a: Point, b: Point) {
        self.cancel_momentum();
        self.pan_gesture = None;
        self.pinch = Some(PinchAnchor {
            distance: a.distance(b),
            zoom: self.zoom,
            pan: self.pan,
            centroid: a.midpoint(b),
        });
    }

    /// Update an active pinch, zooming around the gesture's focal point.
    ///
    /// The document point that sat under the starting centroid ends up under
    /// the current centroid.
    pub fn update_pinch(&mut self, a: Point, b: Point) {
        let Some(start) = self.pinch else {
            return;
        };

        let scale = if start.distance > f64::EPSILON {
            a.distance(b) / start.distance
        } else {
            1.0
        };
        let new_zoom = self.clamp_zoom(start.zoom * scale);
        let centroid = a.midpoint(b);

        self.zoom = new_zoom;
        let grip = start.centroid.to_vec2() - start.pan;
        self.pan = centroid.to_vec2() - grip * (new_zoom / start.zoom);
    }

    pub fn end_pinch(&mut self) {
        self.pinch = None;
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Start a single-finger pan at `touch`.
    pub fn begin_pan(&mut self, touch: Point, now: Instant) {
        self.cancel_momentum();
        self.pinch = None;
        // Anchor in undamped space so a pan already past the limit does not jump.
        let offset = match self.config.resistance {
            Some(r) => Vec2::new(r.invert(self.pan.x), r.invert(self.pan.y)),
            None => self.pan,
        };
        self.pan_gesture = Some(PanAnchor {
            anchor: touch.to_vec2() - offset,
            last_offset: offset,
            last_time: now,
            velocity: Vec2::ZERO,
        });
    }

    /// Move an active pan so the touch keeps its grip on the surface.
    pub fn update_pan(&mut self, touch: Point, now: Instant) {
        let resistance = self.config.resistance;
        let Some(gesture) = self.pan_gesture.as_mut() else {
            return;
        };

        let offset = touch.to_vec2() - gesture.anchor;
        let mut dt = now.saturating_duration_since(gesture.last_time).as_secs_f64() * 1000.0;
        if dt <= 0.0 {
            dt = FALLBACK_SAMPLE_MS;
        }
        gesture.velocity = (offset - gesture.last_offset) / dt;
        gesture.last_offset = offset;
        gesture.last_time = now;

        self.pan = match resistance {
            Some(r) => Vec2::new(r.apply(offset.x), r.apply(offset.y)),
            None => offset,
        };
    }

    /// Release the pan; carries on with momentum when `fling` is set.
    pub fn end_pan(&mut self, fling: bool) {
        if let Some(gesture) = self.pan_gesture.take() {
            if fling {
                self.momentum = Some(gesture.velocity);
            }
        }
    }

    pub fn is_panning(&self) -> bool {
        self.pan_gesture.is_some()
    }

    /// Advance momentum by one animation frame.
    ///
    /// Returns true while the animation is still running.
    pub fn tick(&mut self) -> bool {
        let Some(mut velocity) = self.momentum else {
            return false;
        };

        velocity *= self.config.friction;
        let eps = self.config.momentum_epsilon;
        if velocity.x.abs() < eps && velocity.y.abs() < eps {
            self.momentum = None;
            return false;
        }

        self.pan += velocity * self.config.frame_ms;
        self.momentum = Some(velocity);
        true
    }

    pub fn has_momentum(&self) -> bool {
        self.momentum.is_some()
    }

    pub fn cancel_momentum(&mut self) {
        self.momentum = None;
    }

    /// Reset to zoom 1 with no pan, stopping any gesture or momentum.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
        self.pinch = None;
        self.pan_gesture = None;
        self.momentum = None;
    }
}

/// Coalesces viewport changes into at most one pending frame.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    pending: Option<Affine>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest transform.
    ///
    /// Returns true when the caller should schedule an animation frame, false
    /// when one is already pending (its value is overwritten).
    pub fn request(&mut self, transform: Affine) -> bool {
        self.pending.replace(transform).is_none()
    }

    /// Take the transform to apply in this animation frame.
    pub fn take(&mut self) -> Option<Affine> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::default();
        assert_eq!(viewport.pan, Vec2::ZERO);
        assert_close(viewport.zoom, 1.0);
        assert!(!viewport.is_zoomed());
    }

    #[test]
    fn test_screen_document_roundtrip() {
        let mut viewport = Viewport::default();
        viewport.pan = Vec2::new(30.0, -20.0);
        viewport.zoom = 1.5;

        let original = Point::new(123.0, 456.0);
        let doc = viewport.screen_to_document(original);
        assert_close(doc.x, (123.0 - 30.0) / 1.5);
        let back = viewport.document_to_screen(doc);
        assert_close(back.x, original.x);
        assert_close(back.y, original.y);
    }

    #[test]
    fn test_pinch_doubles_zoom() {
        let mut viewport = Viewport::default();
        viewport.begin_pinch(Point::new(100.0, 100.0), Point::new(200.0, 100.0));
        viewport.update_pinch(Point::new(50.0, 100.0), Point::new(250.0, 100.0));
        assert_close(viewport.zoom, 2.0);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut viewport = Viewport::default();
        viewport.begin_pinch(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        viewport.update_pinch(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert_close(viewport.zoom, viewport.config().max_zoom);

        viewport.reset();
        viewport.begin_pinch(Point::new(0.0, 0.0), Point::new(1000.0, 0.0));
        viewport.update_pinch(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert_close(viewport.zoom, viewport.config().min_zoom);
    }

    #[test]
    fn test_pinch_keeps_focal_point() {
        let mut viewport = Viewport::default();
        viewport.zoom = 1.3;
        viewport.pan = Vec2::new(-40.0, 25.0);

        let a0 = Point::new(120.0, 300.0);
        let b0 = Point::new(260.0, 340.0);
        let anchor = viewport.screen_to_document(a0.midpoint(b0));
        viewport.begin_pinch(a0, b0);

        let steps = [
            (Point::new(110.0, 290.0), Point::new(280.0, 350.0)),
            (Point::new(150.0, 250.0), Point::new(400.0, 420.0)),
            (Point::new(60.0, 100.0), Point::new(700.0, 900.0)),
            (Point::new(200.0, 200.0), Point::new(201.0, 200.0)),
        ];
        for (a, b) in steps {
            viewport.update_pinch(a, b);
            let under = viewport.document_to_screen(anchor);
            let centroid = a.midpoint(b);
            assert!((under.x - centroid.x).abs() < 1e-9);
            assert!((under.y - centroid.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_distance_pinch_keeps_zoom() {
        let mut viewport = Viewport::default();
        let p = Point::new(10.0, 10.0);
        viewport.begin_pinch(p, p);
        viewport.update_pinch(Point::new(0.0, 0.0), Point::new(50.0, 0.0));
        assert_close(viewport.zoom, 1.0);
    }

    #[test]
    fn test_pan_follows_touch() {
        let mut viewport = Viewport::default();
        viewport.pan = Vec2::new(10.0, 10.0);
        let t0 = Instant::now();

        viewport.begin_pan(Point::new(100.0, 100.0), t0);
        viewport.update_pan(Point::new(150.0, 80.0), t0 + Duration::from_millis(16));
        assert_close(viewport.pan.x, 60.0);
        assert_close(viewport.pan.y, -10.0);
    }

    #[test]
    fn test_pan_resistance() {
        let r = Resistance::default();
        assert_close(r.apply(100.0), 100.0);
        assert_close(r.apply(350.0), 280.0);
        assert_close(r.apply(-350.0), -280.0);

        let mut viewport = Viewport::default();
        let t0 = Instant::now();
        viewport.begin_pan(Point::new(0.0, 0.0), t0);
        viewport.update_pan(Point::new(350.0, 0.0), t0 + Duration::from_millis(16));
        assert_close(viewport.pan.x, 280.0);
    }

    #[test]
    fn test_pan_starting_past_limit_keeps_position() {
        let r = Resistance::default();
        assert_close(r.apply(r.invert(280.0)), 280.0);
        assert_close(r.invert(-100.0), -100.0);

        let mut viewport = Viewport::default();
        viewport.pan = Vec2::new(280.0, -400.0);
        let t0 = Instant::now();

        viewport.begin_pan(Point::new(100.0, 100.0), t0);
        viewport.update_pan(Point::new(100.0, 100.0), t0 + Duration::from_millis(16));
        assert_close(viewport.pan.x, 280.0);
        assert_close(viewport.pan.y, -400.0);

        // Further drag past the limit stays damped.
        viewport.update_pan(Point::new(110.0, 100.0), t0 + Duration::from_millis(32));
        assert_close(viewport.pan.x, 283.0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let inverted = ViewportConfig {
            min_zoom: 3.0,
            max_zoom: 2.0,
            ..Default::default()
        };
        assert!(matches!(Viewport::new(inverted), Err(ConfigError::ZoomRange { .. })));

        let nan = ViewportConfig {
            max_zoom: f64::NAN,
            ..Default::default()
        };
        assert!(Viewport::new(nan).is_err());

        let endless = ViewportConfig {
            momentum_epsilon: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            Viewport::new(endless),
            Err(ConfigError::OutOfRange {
                field: "viewport.momentum_epsilon",
                ..
            })
        ));

        assert!(Viewport::new(ViewportConfig::default()).is_ok());
    }

    #[test]
    fn test_momentum_decays_and_stops() {
        let mut viewport = Viewport::default();
        let t0 = Instant::now();
        viewport.begin_pan(Point::new(0.0, 0.0), t0);
        viewport.update_pan(Point::new(32.0, 0.0), t0 + Duration::from_millis(16));
        viewport.end_pan(true);
        assert!(viewport.has_momentum());

        let start = viewport.pan.x;
        assert!(viewport.tick());
        // 2 px/ms decayed once, over one 16 ms frame.
        assert_close(viewport.pan.x - start, 2.0 * 0.94 * 16.0);

        let mut frames = 1;
        while viewport.tick() {
            frames += 1;
            assert!(frames < 1000);
        }
        assert!(!viewport.has_momentum());
    }

    #[test]
    fn test_new_gesture_cancels_momentum() {
        let mut viewport = Viewport::default();
        let t0 = Instant::now();
        viewport.begin_pan(Point::new(0.0, 0.0), t0);
        viewport.update_pan(Point::new(50.0, 0.0), t0 + Duration::from_millis(10));
        viewport.end_pan(true);
        assert!(viewport.has_momentum());

        viewport.begin_pinch(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!(!viewport.has_momentum());
    }

    #[test]
    fn test_reset() {
        let mut viewport = Viewport::default();
        viewport.zoom = 3.0;
        viewport.pan = Vec2::new(5.0, 5.0);
        viewport.reset();
        assert_close(viewport.zoom, 1.0);
        assert_eq!(viewport.pan, Vec2::ZERO);
        assert!(!viewport.has_momentum());
    }

    #[test]
    fn test_frame_coalescing() {
        let mut frames = FrameScheduler::new();
        assert!(frames.request(Affine::scale(2.0)));
        assert!(!frames.request(Affine::scale(3.0)));
        assert_eq!(frames.take(), Some(Affine::scale(3.0)));
        assert!(frames.take().is_none());
        assert!(frames.request(Affine::IDENTITY));
    }
}
