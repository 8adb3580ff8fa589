pub struct FixedTimestep {
    tick_rate: u32,
    dt: f32,
    accumulator: f32,
    tick: u64,
}

impl FixedTimestep {
    /// Longest frame folded into the accumulator at once.
    const MAX_FRAME_TIME: f32 = 0.25;

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

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.min(Self::MAX_FRAME_TIME);
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

    /// Counts a tick that was run outside the accumulator.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.tick = 0;
    }
}
