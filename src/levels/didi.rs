//! Differential-drive levels in a walled bedroom

use std::f64::consts::{FRAC_PI_2, PI};

use log::debug;

use super::{GoalState, GoalStatus, Level, LevelInfo};
use crate::simulation::{
    compute_ogrid_from_poses, ActorConfig, AssetConfig, PhysicsConfig, Point2, Pose,
};

/// Distance between Didi's wheels (m)
pub const DIDI_TRACK_WIDTH: f64 = 0.235;
/// Radius of Didi's round body (m)
pub const DIDI_RADIUS: f64 = 0.17;
const WALL_THICKNESS: f64 = 0.1;

/// Rectangular room layout; `length` runs along x, `width` along y
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Room {
    pub origin: Point2,
    pub length: f64,
    pub width: f64,
}

impl Default for Room {
    fn default() -> Self {
        Self {
            origin: Point2::new(0.0, 0.0),
            length: 3.75,
            width: 4.125,
        }
    }
}

impl Room {
    pub fn left(&self) -> f64 {
        self.origin.x - 0.2
    }

    pub fn right(&self) -> f64 {
        self.left() + self.length
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y - 0.2
    }

    pub fn top(&self) -> f64 {
        self.bottom() + self.width
    }

    pub fn mid(&self) -> Point2 {
        Point2::new(
            (self.left() + self.right()) / 2.0,
            (self.bottom() + self.top()) / 2.0,
        )
    }

    /// Didi facing +y at `start`, followed by the four walls
    pub fn actors(&self, start: Point2) -> Vec<ActorConfig> {
        let mid = self.mid();
        let t = WALL_THICKNESS;
        let wall = |name: &str, x: f64, y: f64, length: f64, width: f64| {
            ActorConfig::new(name, PhysicsConfig::static_model())
                .with_pose(Pose::planar(x, y, 0.0))
                .with_asset(AssetConfig::rectangle(length, width))
        };

        vec![
            ActorConfig::new("didi", PhysicsConfig::differential_drive(DIDI_TRACK_WIDTH))
                .with_pose(Pose::planar(start.x, start.y, FRAC_PI_2))
                .with_asset(AssetConfig::from_circle(Point2::new(0.0, 0.0), DIDI_RADIUS))
                .primary(),
            wall("top-wall", mid.x, self.top() + t / 2.0, self.length + 0.2, t),
            wall("left-wall", self.left() - t / 2.0, mid.y, t, self.width + 0.2),
            wall("bottom-wall", mid.x, self.bottom() - t / 2.0, self.length + 0.2, t),
            wall("right-wall", self.right() + t / 2.0, mid.y, t, self.width + 0.2),
        ]
    }
}

/// Drive back to the charger in the bottom-left corner, facing it
#[derive(Debug, Clone, Default)]
pub struct DidiGoesHome {
    pub room: Room,
}

impl DidiGoesHome {
    pub fn charger(&self) -> Point2 {
        self.room.origin
    }
}

impl Level for DidiGoesHome {
    fn info(&self) -> LevelInfo {
        LevelInfo {
            name: "Didi Heads Home".to_string(),
            description: "Set Didi's wheel speeds to drive back to the charger in the bottom left corner."
                .to_string(),
            ego: "didi".to_string(),
        }
    }

    fn actors(&self) -> Vec<ActorConfig> {
        let o = self.room.origin;
        self.room.actors(Point2::new(o.x + 1.0, o.y + 2.0))
    }

    fn check_goal(&mut self, state: &GoalState<'_>) -> GoalStatus {
        let charger = self.charger();
        let dx = (state.pose.x - charger.x).abs();
        let dy = (state.pose.y - charger.y).abs();
        let dyaw = (state.pose.yaw - 1.5 * PI).abs();
        if dx < 0.2 && dy < 0.2 && dyaw < 0.2 {
            return GoalStatus::passed("you did it!");
        }
        GoalStatus::pending()
    }

    fn timeout(&self) -> f64 {
        30.0
    }
}

/// Cover at least half of the floor
#[derive(Debug, Clone)]
pub struct HelloDidi {
    pub room: Room,
    pub grid_resolution: f64,
    hit_count: usize,
}

impl Default for HelloDidi {
    fn default() -> Self {
        Self {
            room: Room::default(),
            grid_resolution: 0.375,
            hit_count: 0,
        }
    }
}

impl HelloDidi {
    pub fn grid_size(&self) -> (usize, usize) {
        let rows = (self.room.width / self.grid_resolution).round() as usize;
        let cols = (self.room.length / self.grid_resolution).round() as usize;
        (rows, cols)
    }

    /// Cells visited on the last goal check
    pub fn hit_count(&self) -> usize {
        self.hit_count
    }
}

impl Level for HelloDidi {
    fn info(&self) -> LevelInfo {
        LevelInfo {
            name: "Didi Cleans Up".to_string(),
            description: "Drive Didi over the room to get everything clean.".to_string(),
            ego: "didi".to_string(),
        }
    }

    fn actors(&self) -> Vec<ActorConfig> {
        self.room.actors(self.room.origin)
    }

    fn check_goal(&mut self, state: &GoalState<'_>) -> GoalStatus {
        let (rows, cols) = self.grid_size();
        let points: Vec<Point2> = state.poses.iter().map(|p| Point2::new(p.x, p.y)).collect();
        let origin = Point2::new(self.room.left(), self.room.bottom());
        let grid = compute_ogrid_from_poses(&points, rows, cols, self.grid_resolution, origin);

        let hits = grid.iter().filter(|&&cell| cell == 1).count();
        if hits != self.hit_count {
            debug!("coverage {}/{}", hits, rows * cols);
        }
        self.hit_count = hits;

        if hits as f64 >= (rows * cols) as f64 * 0.5 {
            return GoalStatus::passed("done!");
        }
        GoalStatus::pending()
    }

    fn timeout(&self) -> f64 {
        300.0
    }

    fn reset(&mut self) {
        self.hit_count = 0;
    }
}
