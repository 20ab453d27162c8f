use hand_core::FrameBounds;

/// Configuration for the capture/inference/display pipeline
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub bounds: FrameBounds,
    /// Frames the displayed camera image lags behind capture
    pub display_delay: usize,
    /// Smooth reported timings with exponential filters
    pub filtered_timings: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bounds: FrameBounds::new(800, 480),
            display_delay: 1,
            filtered_timings: true,
        }
    }
}

impl PipelineConfig {
    /// Display buffers in the capture ring
    pub fn display_buffers(&self) -> usize {
        self.display_delay + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_ring_size() {
        let config = PipelineConfig::default();
        assert_eq!(config.display_buffers(), 3);

        let config = PipelineConfig {
            display_delay: 0,
            ..config
        };
        assert_eq!(config.display_buffers(), 2);
    }
}
