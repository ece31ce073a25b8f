use arena::{ArenaConfig, PacketLossSimulation};

/// Harness settings around the game's own `ArenaConfig`.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub arena: ArenaConfig,
    pub bots: usize,
    pub duration_secs: f32,
    pub realtime: bool,
    pub packet_loss: Option<PacketLossSimulation>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            bots: 3,
            duration_secs: 30.0,
            realtime: false,
            packet_loss: None,
        }
    }
}

impl SimConfig {
    pub fn total_ticks(&self) -> u64 {
        (self.duration_secs.max(0.0) * self.arena.tick_rate as f32) as u64
    }
}
