/// Linear congruential generator driving the synthetic scene.
/// Seeded runs are reproducible, which is all the simulator needs.
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        // Numerical Recipes constants
        const A: u32 = 1664525;
        const C: u32 = 1013904223;

        self.state = self.state.wrapping_mul(A).wrapping_add(C);
        self.state
    }

    /// Uniform in `[0.0, 1.0)`
    pub fn next_f32(&mut self) -> f32 {
        // top 24 bits fit the mantissa exactly
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// True with probability `p`
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }
}
