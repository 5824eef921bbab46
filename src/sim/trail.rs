//! Bounded pointer trail buffer
//!
//! The input producer (hand tracking, mouse or touch) appends timestamped
//! points; the collision resolver reads a short window of the newest points
//! each tick. The host's single-threaded turn model means producer and
//! consumer never run concurrently, so no locking is needed.

use glam::Vec2;

use crate::consts::{SWIPE_SPEED_THRESHOLD, TRAIL_CAPACITY, TRAIL_STALE_AGE, TRAIL_WINDOW};

/// One recorded pointer position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub pos: Vec2,
    /// Host clock timestamp in seconds
    pub t: f64,
}

/// Time-ordered buffer of recent pointer positions, newest-last
#[derive(Debug, Clone, Default)]
pub struct Trail {
    points: Vec<TrailPoint>,
}

impl Trail {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(TRAIL_CAPACITY),
        }
    }

    /// Append a point, evicting the oldest when at capacity
    pub fn push(&mut self, pos: Vec2, t: f64) {
        if self.points.len() >= TRAIL_CAPACITY {
            self.points.remove(0);
        }
        self.points.push(TrailPoint { pos, t });
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

    /// All recorded points, oldest-first (for blade rendering)
    pub fn points(&self) -> &[TrailPoint] {
        &self.points
    }

    /// The newest points considered for collision, oldest-first
    pub fn window(&self) -> &[TrailPoint] {
        let start = self.points.len().saturating_sub(TRAIL_WINDOW);
        &self.points[start..]
    }

    /// Whether the pointer is moving fast enough to count as a swipe at
    /// clock instant `now` (same clock as the pushed timestamps). A trail
    /// whose newest point is older than the staleness window means the
    /// pointer stopped or tracking was lost; the leftover polyline must not
    /// keep slicing, so a stale trail never swipes.
    pub fn is_swiping(&self, now: f64) -> bool {
        let n = self.points.len();
        if n < 2 {
            return false;
        }
        let b = self.points[n - 1];
        if now - b.t > TRAIL_STALE_AGE {
            return false;
        }
        // Speed against the newest strictly older sample; producers can
        // deliver several points with the same timestamp in one frame
        let Some(a) = self.points[..n - 1].iter().rev().find(|p| p.t < b.t) else {
            return false;
        };
        let dt = (b.t - a.t) as f32;
        (b.pos - a.pos).length() / dt >= SWIPE_SPEED_THRESHOLD
    }
}
