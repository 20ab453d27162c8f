/// Exponential moving average weighting the history by `(weight - 1) / weight`
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    value: f32,
    weight: f32,
    enabled: bool,
}

impl Ema {
    pub const fn new(weight: u32, enabled: bool) -> Self {
        Self {
            value: 0.0,
            weight: weight as f32,
            enabled,
        }
    }

    /// Folds a sample in. When disabled the filter just tracks the last sample.
    pub fn update(&mut self, sample: f32) -> f32 {
        self.value = if self.enabled {
            ((self.weight - 1.0) * self.value + sample) / self.weight
        } else {
            sample
        };
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

/// Network period, inference time of each model
#[derive(Debug, Clone, Copy)]
pub struct CycleTimings {
    pub nn_period: Ema,
    pub pd: Ema,
    pub hl: Ema,
}

impl CycleTimings {
    pub const fn new(filtered: bool) -> Self {
        Self {
            nn_period: Ema::new(16, filtered),
            pd: Ema::new(8, filtered),
            hl: Ema::new(8, filtered),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_update() {
        let mut ema = Ema::new(16, true);
        assert_eq!(ema.update(32.0), 2.0);
        assert_eq!(ema.update(32.0), (15.0 * 2.0 + 32.0) / 16.0);
    }

    #[test]
    fn test_unfiltered_update() {
        let mut ema = Ema::new(8, false);
        assert_eq!(ema.update(12.0), 12.0);
        assert_eq!(ema.update(3.0), 3.0);
        assert_eq!(ema.value(), 3.0);
    }

    #[test]
    fn test_converges() {
        let mut ema = Ema::new(8, true);
        for _ in 0..200 {
            ema.update(40.0);
        }
        assert!((ema.value() - 40.0).abs() < 0.01);
    }
}
