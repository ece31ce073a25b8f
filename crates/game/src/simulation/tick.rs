/// Accumulator-driven fixed timestep with a deterministic millisecond clock.
///
/// Simulation time advances only by whole ticks, so `now_ms` is reproducible
/// regardless of how wall-clock frames are sliced.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    tick_rate: u32,
    dt: f32,
    accumulator: f32,
    tick: u64,
}

impl FixedTimestep {
    const MAX_FRAME: f32 = 0.25;

    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_rate,
            dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
            tick: 0,
        }
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Ticks consumed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn now_ms(&self) -> u64 {
        self.tick * 1000 / self.tick_rate as u64
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.min(Self::MAX_FRAME);
    }

    pub fn should_tick(&self) -> bool {
        self.accumulator >= self.dt
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            self.tick += 1;
            true
        } else {
            false
        }
    }
}
