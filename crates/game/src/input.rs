use bitflags::bitflags;
use glam::Vec2;
use rkyv::{Archive, Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Keys: u8 {
        const FORWARD = 1 << 0;
        const BACK = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const FIRE = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JoystickState {
    pub angle: Option<f32>,
    pub pressed: bool,
    pub fire: bool,
}

/// One frame of player intent as supplied by the input devices.
///
/// `direction` is in the world XZ plane (x, z).
#[derive(Debug, Clone, Copy, Default, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct InputFrame {
    pub direction: [f32; 2],
    pub moving: bool,
    pub fire: bool,
}

impl InputFrame {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving_at(angle: f32) -> Self {
        Self {
            direction: [angle.sin(), angle.cos()],
            moving: true,
            fire: false,
        }
    }

    pub fn with_fire(mut self, fire: bool) -> Self {
        self.fire = fire;
        self
    }

    /// Merges keyboard and joystick. Keyboard movement wins over the joystick angle.
    pub fn from_devices(keys: Keys, joystick: &JoystickState) -> Self {
        let mut x = 0.0;
        let mut z = 0.0;
        if keys.contains(Keys::FORWARD) {
            z -= 1.0;
        }
        if keys.contains(Keys::BACK) {
            z += 1.0;
        }
        if keys.contains(Keys::LEFT) {
            x -= 1.0;
        }
        if keys.contains(Keys::RIGHT) {
            x += 1.0;
        }

        let keyboard_moving = keys.intersects(Keys::FORWARD | Keys::BACK | Keys::LEFT | Keys::RIGHT);
        let fire = keys.contains(Keys::FIRE) || joystick.fire;

        if keyboard_moving {
            let direction = Vec2::new(x, z).normalize_or_zero();
            return Self {
                direction: direction.into(),
                moving: true,
                fire,
            };
        }

        match joystick.angle {
            Some(angle) if joystick.pressed && angle != 0.0 => Self {
                direction: [angle.sin(), angle.cos()],
                moving: true,
                fire,
            },
            _ => Self {
                direction: [0.0, 0.0],
                moving: false,
                fire,
            },
        }
    }

    /// World-frame heading; `None` when the frame carries no direction.
    pub fn heading(&self) -> Option<f32> {
        let direction = Vec2::from(self.direction);
        if direction.length_squared() < 1e-6 {
            return None;
        }
        Some(direction.x.atan2(direction.y))
    }
}

/// Turns a held fire button into one intent per press.
#[derive(Debug, Clone, Copy, Default)]
pub struct FireTrigger {
    locked: bool,
}

impl FireTrigger {
    pub fn update(&mut self, pressed: bool) -> bool {
        if pressed && !self.locked {
            self.locked = true;
            true
        } else {
            if !pressed {
                self.locked = false;
            }
            false
        }
    }
}
