//! A shape orbiting the view center, with a trail of where it has been.
//!
//! All geometry is in screen space: origin top-left, y grows downward.

use std::collections::VecDeque;
use std::f64::consts::TAU;

use super::theme::Rgb;

/// A point in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The point `radius` away from `self` in direction `angle`.
    pub fn polar(self, radius: f32, angle: f64) -> Point {
        Point {
            x: (self.x as f64 + angle.cos() * radius as f64) as f32,
            y: (self.y as f64 + angle.sin() * radius as f64) as f32,
        }
    }
}

/// The closed set of drawable shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Circle,
    Square,
    Triangle,
}

/// Fixed per-shape parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeConfig {
    /// How strongly band intensity grows the shape
    pub size_multiplier: f32,
    /// Orbit radius as a fraction of the shorter half-dimension of the view
    pub orbit_fraction: f32,
    pub kind: ShapeKind,
}

impl ShapeConfig {
    pub const BASS: ShapeConfig = ShapeConfig {
        size_multiplier: 1.5,
        orbit_fraction: 0.20,
        kind: ShapeKind::Circle,
    };
    pub const MID: ShapeConfig = ShapeConfig {
        size_multiplier: 3.0,
        orbit_fraction: 0.60,
        kind: ShapeKind::Square,
    };
    pub const TREBLE: ShapeConfig = ShapeConfig {
        size_multiplier: 5.0,
        orbit_fraction: 0.90,
        kind: ShapeKind::Triangle,
    };
}

/// Per-frame values shared by every shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub center: Point,
    pub min_size: f32,
}

/// Filled geometry for one shape at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Circle { center: Point, radius: f32 },
    /// Axis-aligned square
    Square { center: Point, half_extent: f32 },
    Triangle { apex: Point, right: Point, left: Point },
}

impl Primitive {
    fn build(kind: ShapeKind, center: Point, size: f32) -> Primitive {
        match kind {
            ShapeKind::Circle => Primitive::Circle {
                center,
                radius: size,
            },
            ShapeKind::Square => Primitive::Square {
                center,
                half_extent: size,
            },
            ShapeKind::Triangle => Primitive::Triangle {
                apex: Point::new(center.x, center.y - size),
                right: Point::new(center.x + size, center.y + size / 2.0),
                left: Point::new(center.x - size, center.y + size / 2.0),
            },
        }
    }

    /// Whether `p` lies inside the filled primitive.
    pub fn contains(&self, p: Point) -> bool {
        match *self {
            Primitive::Circle { center, radius } => {
                let dx = p.x - center.x;
                let dy = p.y - center.y;
                dx * dx + dy * dy <= radius * radius
            }
            Primitive::Square {
                center,
                half_extent,
            } => (p.x - center.x).abs() <= half_extent && (p.y - center.y).abs() <= half_extent,
            Primitive::Triangle { apex, right, left } => {
                let edge = |a: Point, b: Point| (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
                let d1 = edge(apex, right);
                let d2 = edge(right, left);
                let d3 = edge(left, apex);
                let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
                let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
                !(has_neg && has_pos)
            }
        }
    }

    /// Axis-aligned bounds as (min, max).
    pub fn bounds(&self) -> (Point, Point) {
        match *self {
            Primitive::Circle { center, radius } => (
                Point::new(center.x - radius, center.y - radius),
                Point::new(center.x + radius, center.y + radius),
            ),
            Primitive::Square {
                center,
                half_extent,
            } => (
                Point::new(center.x - half_extent, center.y - half_extent),
                Point::new(center.x + half_extent, center.y + half_extent),
            ),
            Primitive::Triangle { apex, right, left } => (
                Point::new(left.x, apex.y),
                Point::new(right.x, right.y.max(left.y)),
            ),
        }
    }
}

/// A recorded trail sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub x: f32,
    pub y: f32,
    pub theta: f64,
}

/// Positions covering at most one revolution, oldest first.
#[derive(Debug, Default)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
}

impl Trail {
    /// Appends a sample and evicts everything more than one revolution older.
    ///
    /// A sample older than the newest one can only come from a restarted
    /// clock, in which case the old trail is dropped first.
    pub fn push(&mut self, point: TrailPoint) {
        if self.points.back().is_some_and(|newest| point.theta < newest.theta) {
            self.points.clear();
        }
        self.points.push_back(point);

        while let Some(oldest) = self.points.front() {
            if point.theta - oldest.theta > TAU {
                self.points.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    /// Angle spanned from oldest to newest sample.
    pub fn span(&self) -> f64 {
        match (self.points.front(), self.points.back()) {
            (Some(oldest), Some(newest)) => newest.theta - oldest.theta,
            _ => 0.0,
        }
    }
}

/// Everything needed to draw one shape for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFrame {
    pub primitive: Primitive,
    /// Connected polyline through the trail, oldest to newest
    pub trail: Vec<Point>,
    pub fill: Rgb,
    pub stroke: Rgb,
}

/// A shape plus its trail.
#[derive(Debug)]
pub struct TrailedShape {
    config: ShapeConfig,
    trail: Trail,
    radius_from_center: f32,
    fill: Rgb,
    stroke: Rgb,
}

impl TrailedShape {
    pub fn new(config: ShapeConfig, fill: Rgb, stroke: Rgb) -> Self {
        Self {
            config,
            trail: Trail::default(),
            radius_from_center: 0.0,
            fill,
            stroke,
        }
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn radius_from_center(&self) -> f32 {
        self.radius_from_center
    }

    /// Sets the orbit radius from the view's shorter half-dimension.
    pub fn set_orbit(&mut self, short_side: f32) {
        self.radius_from_center = short_side * self.config.orbit_fraction;
    }

    pub fn set_colors(&mut self, fill: Rgb, stroke: Rgb) {
        self.fill = fill;
        self.stroke = stroke;
    }

    /// Size of the shape for a given band intensity.
    pub fn size_for(&self, min_size: f32, intensity: f32) -> f32 {
        min_size + self.config.size_multiplier * intensity
    }

    /// Advances the shape to `angle`, records a trail sample and returns the
    /// geometry to draw.
    pub fn update(&mut self, ctx: &FrameContext, angle: f64, intensity: f32) -> ShapeFrame {
        let size = self.size_for(ctx.min_size, intensity);
        let shape_center = ctx.center.polar(self.radius_from_center, angle);

        // The trail rides the outer edge of the shape, not its center
        let edge = ctx
            .center
            .polar(self.radius_from_center + size - ctx.min_size, angle);
        self.trail.push(TrailPoint {
            x: edge.x,
            y: edge.y,
            theta: angle,
        });

        ShapeFrame {
            primitive: Primitive::build(self.config.kind, shape_center, size),
            trail: self.trail.iter().map(|p| Point::new(p.x, p.y)).collect(),
            fill: self.fill,
            stroke: self.stroke,
        }
    }

    pub fn restart_trail(&mut self) {
        self.trail.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MIN_SIZE: f32 = 50.0;

    fn context() -> FrameContext {
        FrameContext {
            center: Point::new(500.0, 400.0),
            min_size: MIN_SIZE,
        }
    }

    fn shape(config: ShapeConfig) -> TrailedShape {
        let mut shape = TrailedShape::new(config, Rgb(255, 0, 0), Rgb(0, 0, 255));
        shape.set_orbit(400.0);
        shape
    }

    #[test]
    fn test_size_at_rest_is_min_size() {
        let s = shape(ShapeConfig::BASS);
        assert_eq!(s.size_for(MIN_SIZE, 0.0), MIN_SIZE);
    }

    #[test]
    fn test_size_grows_with_intensity() {
        let s = shape(ShapeConfig::BASS);
        assert_eq!(s.size_for(MIN_SIZE, 10.0), MIN_SIZE + 15.0);
    }

    #[test]
    fn test_circle_position_and_trail_edge() {
        let mut s = shape(ShapeConfig::BASS);
        let frame = s.update(&context(), 0.0, 10.0);

        // orbit radius = 400 * 0.2 = 80, size = 65
        match frame.primitive {
            Primitive::Circle { center, radius } => {
                assert!((center.x - 580.0).abs() < 1e-3);
                assert!((center.y - 400.0).abs() < 1e-3);
                assert_eq!(radius, 65.0);
            }
            other => panic!("expected circle, got {other:?}"),
        }

        // trail point sits at orbit + (size - min_size) = 95
        assert_eq!(frame.trail.len(), 1);
        assert!((frame.trail[0].x - 595.0).abs() < 1e-3);
    }

    #[test]
    fn test_triangle_geometry() {
        let mut s = shape(ShapeConfig::TREBLE);
        let frame = s.update(&context(), std::f64::consts::FRAC_PI_2, 0.0);

        // orbit radius = 360, straight down in screen space
        match frame.primitive {
            Primitive::Triangle { apex, right, left } => {
                assert!((apex.x - 500.0).abs() < 1e-3);
                assert!((apex.y - (760.0 - 50.0)).abs() < 1e-3);
                assert!((right.x - 550.0).abs() < 1e-3);
                assert!((right.y - 785.0).abs() < 1e-3);
                assert!((left.x - 450.0).abs() < 1e-3);
                assert!((left.y - 785.0).abs() < 1e-3);
            }
            other => panic!("expected triangle, got {other:?}"),
        }
    }

    #[test]
    fn test_square_contains() {
        let square = Primitive::Square {
            center: Point::new(0.0, 0.0),
            half_extent: 10.0,
        };
        assert!(square.contains(Point::new(9.0, -9.0)));
        assert!(!square.contains(Point::new(11.0, 0.0)));
    }

    #[test]
    fn test_triangle_contains() {
        let triangle = Primitive::build(ShapeKind::Triangle, Point::new(0.0, 0.0), 10.0);
        assert!(triangle.contains(Point::new(0.0, 0.0)));
        assert!(triangle.contains(Point::new(0.0, -9.0)));
        assert!(!triangle.contains(Point::new(9.0, -9.0)));
        assert!(!triangle.contains(Point::new(0.0, 6.0)));
    }

    #[test]
    fn test_trail_evicts_after_one_revolution() {
        let mut s = shape(ShapeConfig::MID);
        let ctx = context();
        for step in 0..=40 {
            s.update(&ctx, step as f64 * 0.25, 1.0);
        }
        // last angle 10.0, keep thetas >= 10.0 - 2pi = 3.717 -> 3.75 onward
        assert!(s.trail().span() <= TAU);
        assert_eq!(s.trail().iter().next().unwrap().theta, 3.75);
        assert_eq!(s.trail().len(), 26);
    }

    #[test]
    fn test_restart_trail() {
        let mut s = shape(ShapeConfig::MID);
        s.update(&context(), 0.0, 1.0);
        s.update(&context(), 0.1, 1.0);
        s.restart_trail();
        assert!(s.trail().is_empty());
    }

    #[test]
    fn test_trail_clears_on_backwards_angle() {
        let mut trail = Trail::default();
        trail.push(TrailPoint { x: 0.0, y: 0.0, theta: 5.0 });
        trail.push(TrailPoint { x: 0.0, y: 0.0, theta: 0.0 });
        assert_eq!(trail.len(), 1);
    }

    proptest! {
        #[test]
        fn trail_spans_at_most_one_revolution(
            steps in proptest::collection::vec(0.0f64..2.0, 1..400),
            intensities in proptest::collection::vec(0.0f32..128.0, 1..400),
        ) {
            let mut s = shape(ShapeConfig::TREBLE);
            let ctx = context();
            let mut angle = 0.0;
            let mut previous: Vec<TrailPoint> = Vec::new();

            for (i, step) in steps.iter().enumerate() {
                angle += step;
                let intensity = intensities[i % intensities.len()];
                s.update(&ctx, angle, intensity);

                let current: Vec<TrailPoint> = s.trail().iter().copied().collect();
                prop_assert!(s.trail().span() <= TAU);
                prop_assert!(current.windows(2).all(|w| w[0].theta <= w[1].theta));

                // only the oldest points are ever evicted
                let evicted = previous.len() + 1 - current.len();
                prop_assert_eq!(&previous[evicted..], &current[..current.len() - 1]);
                previous = current;
            }
        }
    }
}
