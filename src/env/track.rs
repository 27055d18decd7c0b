//! Track geometry: walls, raycasts, and the direction field.
//!
//! A track is a set of wall segments plus a direction field that labels each
//! region of free space with the heading a car should hold there. The field
//! drives both the heading-error observation and the reward.
//!
//! Coordinates are meters in the track frame; angles are radians with 0
//! along +x, measured counterclockwise.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Maximum range of a distance sensor ray.
pub const RAY_LENGTH: f32 = 10.0;
/// Sensor reading reported when a ray hits nothing in range.
pub const RAY_MISS: f32 = 7.0;

/// Available track layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackLayout {
    /// Full course with an inner block, chicane walls, and diagonal corners.
    Map1,
    /// Simple rectangular loop around a center island.
    Map2,
}

impl TrackLayout {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "map1" => Some(Self::Map1),
            "map2" => Some(Self::Map2),
            _ => None,
        }
    }
}

/// A wall as a 2D line segment.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Segment {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Axis-aligned horizontal wall from its center and length.
    fn horizontal(cx: f32, cy: f32, len: f32) -> Self {
        Self::new(cx - len / 2.0, cy, cx + len / 2.0, cy)
    }

    /// Axis-aligned vertical wall from its center and length.
    fn vertical(cx: f32, cy: f32, len: f32) -> Self {
        Self::new(cx, cy - len / 2.0, cx, cy + len / 2.0)
    }

    /// Diagonal wall at the given angle from its center and length.
    fn diagonal(cx: f32, cy: f32, len: f32, angle: f32) -> Self {
        let hx = angle.cos() * len / 2.0;
        let hy = angle.sin() * len / 2.0;
        Self::new(cx - hx, cy - hy, cx + hx, cy + hy)
    }

    /// Shortest distance from a point to the segment.
    pub fn distance_to(&self, px: f32, py: f32) -> f32 {
        let ex = self.x2 - self.x1;
        let ey = self.y2 - self.y1;
        let len_sq = ex * ex + ey * ey;

        let t = if len_sq < 1e-12 {
            0.0
        } else {
            (((px - self.x1) * ex + (py - self.y1) * ey) / len_sq).clamp(0.0, 1.0)
        };

        let cx = self.x1 + t * ex;
        let cy = self.y1 + t * ey;
        ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
    }

    /// Distance along a ray to this segment, if the ray hits it.
    pub fn ray_intersection(&self, ox: f32, oy: f32, dx: f32, dy: f32) -> Option<f32> {
        let ex = self.x2 - self.x1;
        let ey = self.y2 - self.y1;

        let denom = dx * ey - dy * ex;
        if denom.abs() < 1e-9 {
            return None;
        }

        let wx = self.x1 - ox;
        let wy = self.y1 - oy;

        let t = (wx * ey - wy * ex) / denom;
        let s = (wx * dy - wy * dx) / denom;

        if t >= 0.0 && (0.0..=1.0).contains(&s) {
            Some(t)
        } else {
            None
        }
    }
}

/// An axis-aligned region of the direction field.
#[derive(Debug, Clone, Copy)]
struct DirectionRegion {
    x_min: f32,
    x_max: f32,
    y_min: f32,
    y_max: f32,
    /// Expected heading in degrees, in (-180, 180].
    direction_deg: f32,
}

impl DirectionRegion {
    const fn new(x_min: f32, x_max: f32, y_min: f32, y_max: f32, direction_deg: f32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            direction_deg,
        }
    }

    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// Walls plus direction field for one layout.
pub struct Track {
    layout: TrackLayout,
    walls: Vec<Segment>,
    regions: Vec<DirectionRegion>,
}

impl Track {
    pub fn new(layout: TrackLayout) -> Self {
        let (walls, regions) = match layout {
            TrackLayout::Map1 => (map1_walls(), map1_regions()),
            TrackLayout::Map2 => (map2_walls(), map2_regions()),
        };
        Self {
            layout,
            walls,
            regions,
        }
    }

    pub fn layout(&self) -> TrackLayout {
        self.layout
    }

    pub fn walls(&self) -> &[Segment] {
        &self.walls
    }

    /// Cast a ray and return the sensor reading: the hit distance when a
    /// wall lies within [`RAY_LENGTH`], otherwise [`RAY_MISS`].
    pub fn raycast(&self, ox: f32, oy: f32, angle: f32) -> f32 {
        let dx = angle.cos();
        let dy = angle.sin();

        let mut nearest = f32::INFINITY;
        for wall in &self.walls {
            if let Some(t) = wall.ray_intersection(ox, oy, dx, dy) {
                nearest = nearest.min(t);
            }
        }

        if nearest <= RAY_LENGTH {
            nearest
        } else {
            RAY_MISS
        }
    }

    /// Whether a circle of the given radius touches any wall.
    pub fn collides(&self, x: f32, y: f32, radius: f32) -> bool {
        self.walls.iter().any(|w| w.distance_to(x, y) < radius)
    }

    /// Expected heading at a position, in degrees; None outside the field.
    pub fn direction_at(&self, x: f32, y: f32) -> Option<f32> {
        self.regions
            .iter()
            .find(|r| r.contains(x, y))
            .map(|r| r.direction_deg)
    }

    /// Absolute heading error against the direction field, in [0, π].
    ///
    /// `yaw` must already be wrapped into [-π, π]. Positions outside the
    /// field report zero error.
    pub fn diff_angle(&self, x: f32, y: f32, yaw: f32) -> f32 {
        let Some(direction) = self.direction_at(x, y) else {
            return 0.0;
        };

        // The 180° regions compare against ±π, whichever side yaw is on.
        match direction as i32 {
            0 => yaw.abs(),
            45 => (yaw - FRAC_PI_4).abs(),
            90 => (yaw - FRAC_PI_2).abs(),
            135 => (yaw - 3.0 * FRAC_PI_4).abs(),
            180 => (yaw.abs() - PI).abs(),
            -135 => (yaw + 3.0 * FRAC_PI_4).abs(),
            -90 => (yaw + FRAC_PI_2).abs(),
            -45 => (yaw + FRAC_PI_4).abs(),
            _ => 0.0,
        }
    }
}

fn map1_walls() -> Vec<Segment> {
    vec![
        // Outer box
        Segment::horizontal(1.45, -0.025, 2.9),
        Segment::vertical(2.875, 3.25, 6.5),
        Segment::horizontal(1.40, 6.475, 2.9),
        Segment::vertical(-0.025, 3.2, 6.5),
        // Inner structure
        Segment::horizontal(0.70, 1.5, 0.2),
        Segment::vertical(0.775, 1.075, 0.8),
        Segment::horizontal(1.50, 0.70, 1.4),
        Segment::vertical(2.175, 3.225, 5.0),
        Segment::horizontal(1.45, 5.70, 1.4),
        Segment::vertical(0.775, 4.675, 2.0),
        Segment::vertical(0.025, 3.595, 2.6),
        Segment::horizontal(0.70, 2.32, 1.4),
        // Diagonal corner walls
        Segment::diagonal(1.9205, 0.9545, 0.72, FRAC_PI_4),
        Segment::diagonal(1.0295, 0.9545, 0.72, -FRAC_PI_4),
    ]
}

fn map1_regions() -> Vec<DirectionRegion> {
    const X1: f32 = 0.775;
    const X2: f32 = 1.425;
    const X3: f32 = 2.175;
    const X4: f32 = 2.875;
    const Y1: f32 = 0.7;
    const Y2: f32 = 2.32;
    const Y3: f32 = 3.7;
    const Y4: f32 = 4.895;
    const Y5: f32 = 5.7;
    const Y6: f32 = 6.475;
    const Y_MID: f32 = (Y1 + Y2) / 2.0;

    vec![
        DirectionRegion::new(X1, X3, 0.0, Y1, 0.0),
        DirectionRegion::new(X3, X4, 0.0, Y1, 45.0),
        DirectionRegion::new(X1, X2, Y2, Y3, 45.0),
        DirectionRegion::new(X1, X2, Y4, Y5, 45.0),
        DirectionRegion::new(X3, X4, Y1, Y5, 90.0),
        DirectionRegion::new(X1, X2, Y3, Y4, 90.0),
        DirectionRegion::new(X3, X4, Y5, Y6, 135.0),
        DirectionRegion::new(X1, X3, Y1, Y2, 180.0),
        DirectionRegion::new(X1, X3, Y5, Y6, 180.0),
        DirectionRegion::new(0.0, X1, Y5, Y6, -135.0),
        DirectionRegion::new(0.0, X1, Y_MID, Y2, -135.0),
        DirectionRegion::new(0.0, X1, Y1, Y_MID, -90.0),
        DirectionRegion::new(0.0, X1, Y3, Y5, -90.0),
        DirectionRegion::new(X2, X3, Y2, Y4, -90.0),
        DirectionRegion::new(0.0, X1, 0.0, Y1, -45.0),
        DirectionRegion::new(0.0, X1, Y2, Y3, -45.0),
        DirectionRegion::new(X2, X3, Y4, Y5, -45.0),
    ]
}

fn map2_walls() -> Vec<Segment> {
    vec![
        // Outer box (shared with map1)
        Segment::horizontal(1.45, -0.025, 2.9),
        Segment::vertical(2.875, 3.25, 6.5),
        Segment::horizontal(1.40, 6.475, 2.9),
        Segment::vertical(-0.025, 3.2, 6.5),
        // Center island
        Segment::horizontal(1.50, 0.75, 1.4),
        Segment::vertical(2.125, 3.225, 5.0),
        Segment::horizontal(1.50, 5.70, 1.4),
        Segment::vertical(0.825, 3.225, 5.0),
    ]
}

fn map2_regions() -> Vec<DirectionRegion> {
    const X1: f32 = 0.825;
    const X2: f32 = 2.125;
    const X3: f32 = 2.875;
    const Y1: f32 = 0.75;
    const Y2: f32 = 5.7;
    const Y3: f32 = 6.475;

    vec![
        DirectionRegion::new(X1, X2, 0.0, Y1, 0.0),
        DirectionRegion::new(0.0, X1, 0.0, Y1, 0.0),
        DirectionRegion::new(X2, X3, Y1, Y2, 90.0),
        DirectionRegion::new(X2, X3, 0.0, Y1, 90.0),
        DirectionRegion::new(X1, X2, Y2, Y3, 180.0),
        DirectionRegion::new(X2, X3, Y2, Y3, 180.0),
        DirectionRegion::new(0.0, X1, Y1, Y2, -90.0),
        DirectionRegion::new(0.0, X1, Y2, Y3, -90.0),
    ]
}
