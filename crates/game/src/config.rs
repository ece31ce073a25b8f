use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub tick_rate: u32,
    pub max_players: usize,

    pub movement_speed: f32,
    pub smoothing_factor: f32,

    pub fire_rate_ms: u64,
    pub bullet_speed: f32,
    pub bullet_damage: u8,
    pub bullet_max_lifetime_ms: u64,
    pub bullet_max_range: f32,
    pub weapon_offset: Vec3,

    pub max_health: u8,
    pub respawn_delay_ms: u64,

    pub gravity: f32,
    pub player_radius: f32,
    pub player_half_height: f32,
    pub player_collider_offset: f32,
    pub player_linear_damping: f32,
    pub bullet_radius: f32,

    /// Host republishes every retained field value at this interval. Zero disables it.
    pub resync_interval_ticks: u32,
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            max_players: 16,

            movement_speed: 202.0,
            smoothing_factor: 0.15,

            fire_rate_ms: 380,
            bullet_speed: 20.0,
            bullet_damage: 10,
            bullet_max_lifetime_ms: 3_000,
            bullet_max_range: 60.0,
            weapon_offset: Vec3::new(-0.2, 1.4, 0.8),

            max_health: 100,
            respawn_delay_ms: 2_000,

            gravity: -9.81,
            player_radius: 0.6,
            player_half_height: 0.7,
            player_collider_offset: 1.28,
            player_linear_damping: 12.0,
            bullet_radius: 0.05,

            resync_interval_ticks: 30,
            seed: None,
        }
    }
}

impl ArenaConfig {
    /// Bullets are teleported along their line each tick and overlap is only tested
    /// after the step. Below this rate a bullet can skip across a player capsule or
    /// an arena wall between two ticks.
    pub const MIN_TICK_RATE: u32 = 30;

    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}
