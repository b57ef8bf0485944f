//! Pseudo-3D lane projection
//!
//! Maps a lane/depth coordinate to a screen position in percent of the view
//! (x: 0 left .. 100 right, y: 0 top .. 100 bottom) and a sprite scale.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Camera constants for the runner view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    /// Scale at the horizon
    pub base_scale: f32,
    /// Quadratic scale growth with depth fraction
    pub scale_gain: f32,
    /// Screen y of the horizon
    pub horizon_y: f32,
    /// Screen y travelled per unit of depth fraction
    pub vertical_gain: f32,
    /// Screen x of the middle lane
    pub center_x: f32,
    /// Lane spacing at depth fraction 1
    pub lateral_spread: f32,
    /// Depth clamp range; depth fraction is `clamp(depth) / depth_span`
    pub min_depth: f32,
    pub max_depth: f32,
    pub depth_span: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            base_scale: 0.3,
            scale_gain: 1.5,
            horizon_y: 35.0,
            vertical_gain: 65.0,
            center_x: 50.0,
            lateral_spread: 40.0,
            min_depth: -50.0,
            max_depth: 120.0,
            depth_span: 100.0,
        }
    }
}

/// Screen-space placement of one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projected {
    pub pos: Vec2,
    pub scale: f32,
    /// Draw order, nearer entities are higher
    pub layer: i32,
    /// Entities still behind the spawn line are hidden
    pub visible: bool,
}

impl Projection {
    pub fn depth_fraction(&self, depth: f32) -> f32 {
        if self.depth_span <= 0.0 {
            return 0.0;
        }
        depth.clamp(self.min_depth, self.max_depth) / self.depth_span
    }

    pub fn project(&self, lane: i8, depth: f32) -> Projected {
        let f = self.depth_fraction(depth);
        Projected {
            pos: Vec2::new(
                self.center_x + f32::from(lane) * self.lateral_spread * f,
                self.horizon_y + f * self.vertical_gain,
            ),
            scale: self.base_scale + f * f * self.scale_gain,
            layer: (depth.clamp(self.min_depth, self.max_depth) * 10.0) as i32,
            visible: depth >= 0.0,
        }
    }
}
