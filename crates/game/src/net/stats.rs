use rand::Rng;

/// Lossy-link emulation for data messages on the loopback hub.
#[derive(Debug, Clone, Default)]
pub struct PacketLossSimulation {
    pub enabled: bool,
    pub loss_percent: f32,
    pub reorder_percent: f32,
}

impl PacketLossSimulation {
    pub fn lossy(loss_percent: f32, reorder_percent: f32) -> Self {
        Self {
            enabled: true,
            loss_percent,
            reorder_percent,
        }
    }

    pub fn should_drop<R: Rng>(&self, rng: &mut R) -> bool {
        self.enabled && self.loss_percent > 0.0 && rng.random::<f32>() * 100.0 < self.loss_percent
    }

    pub fn should_reorder<R: Rng>(&self, rng: &mut R) -> bool {
        self.enabled
            && self.reorder_percent > 0.0
            && rng.random::<f32>() * 100.0 < self.reorder_percent
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_dropped: u64,
    pub messages_reordered: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl NetworkStats {
    pub fn loss_percent(&self) -> f32 {
        let attempted = self.messages_received + self.messages_dropped;
        if attempted == 0 {
            return 0.0;
        }
        self.messages_dropped as f32 / attempted as f32 * 100.0
    }
}
