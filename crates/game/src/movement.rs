use std::collections::HashMap;

use glam::Vec3;

use crate::input::InputFrame;
use crate::session::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Animation {
    #[default]
    Idle,
    Run,
    IdleShoot,
    RunShoot,
    Death,
}

impl Animation {
    pub fn select(dead: bool, moving: bool, shooting: bool) -> Self {
        match (dead, moving, shooting) {
            (true, _, _) => Self::Death,
            (false, true, true) => Self::RunShoot,
            (false, true, false) => Self::Run,
            (false, false, true) => Self::IdleShoot,
            (false, false, false) => Self::Idle,
        }
    }
}

/// Impulse for one tick of movement along `angle` (radians about +Y, 0 = +Z).
pub fn movement_impulse(angle: f32, speed: f32, dt: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(sin, 0.0, cos) * speed * dt
}

/// Heading to move and face this tick. Movement direction beats the standing facing.
pub fn resolve_heading(input: &InputFrame, facing: f32) -> f32 {
    if input.moving {
        input.heading().unwrap_or(facing)
    } else {
        facing
    }
}

pub fn smooth_towards(current: Vec3, target: Vec3, alpha: f32) -> Vec3 {
    current + (target - current) * alpha
}

/// Peer-side positional smoothing toward the last authoritative position.
#[derive(Debug)]
pub struct Reconciler {
    alpha: f32,
    positions: HashMap<PlayerId, Vec3>,
}

impl Reconciler {
    const MOVING_EPSILON: f32 = 1e-3;

    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            positions: HashMap::new(),
        }
    }

    /// Advances one tick and returns the new local position.
    ///
    /// The first sample for a player snaps; later samples converge by `alpha` per tick.
    pub fn step(&mut self, player: PlayerId, target: Vec3) -> Vec3 {
        let alpha = self.alpha;
        let position = self
            .positions
            .entry(player)
            .and_modify(|current| *current = smooth_towards(*current, target, alpha))
            .or_insert(target);
        *position
    }

    pub fn position(&self, player: PlayerId) -> Option<Vec3> {
        self.positions.get(&player).copied()
    }

    pub fn is_converging(&self, player: PlayerId, target: Vec3) -> bool {
        self.position(player)
            .is_some_and(|p| p.distance(target) > Self::MOVING_EPSILON)
    }

    pub fn forget(&mut self, player: PlayerId) {
        self.positions.remove(&player);
    }
}
