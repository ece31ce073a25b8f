use glam::Vec3;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use arena::{InputFrame, PlayerId, PlayerView};

/// Scripted player: wanders, and when an enemy is close turns toward it and
/// taps the trigger.
#[derive(Debug)]
pub struct Bot {
    id: PlayerId,
    rng: StdRng,
    heading: f32,
    moving: bool,
    next_turn_ms: u64,
    trigger_held: bool,
}

impl Bot {
    const ENGAGE_RANGE: f32 = 15.0;

    pub fn new(id: PlayerId, seed: u64) -> Self {
        Self {
            id,
            rng: StdRng::seed_from_u64(seed ^ id as u64),
            heading: 0.0,
            moving: false,
            next_turn_ms: 0,
            trigger_held: false,
        }
    }

    pub fn decide(&mut self, now_ms: u64, players: &[PlayerView]) -> InputFrame {
        let Some(me) = players.iter().find(|p| p.id == self.id) else {
            return InputFrame::idle();
        };
        if me.dead {
            self.trigger_held = false;
            return InputFrame::idle();
        }

        let target = players
            .iter()
            .filter(|p| p.id != self.id && !p.dead)
            .map(|p| (p.position, p.position.distance(me.position)))
            .filter(|(_, d)| *d < Self::ENGAGE_RANGE)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((position, _)) = target {
            // Release every other tick so each press is a fresh trigger pull.
            self.trigger_held = !self.trigger_held;
            self.heading = heading_to(me.position, position);
            return InputFrame::moving_at(self.heading).with_fire(self.trigger_held);
        }

        if now_ms >= self.next_turn_ms {
            self.heading = self.rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
            self.moving = self.rng.random_bool(0.75);
            self.next_turn_ms = now_ms + self.rng.random_range(500..1500);
        }
        self.trigger_held = false;

        if self.moving {
            InputFrame::moving_at(self.heading)
        } else {
            InputFrame::idle()
        }
    }
}

fn heading_to(from: Vec3, to: Vec3) -> f32 {
    let d = to - from;
    d.x.atan2(d.z)
}
