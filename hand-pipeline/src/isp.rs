use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::Pipeline;

/// Sensor statistics and exposure update, run once per vsync
pub trait SensorUpdate {
    fn update(&mut self);
}

pub struct IspTask<S: SensorUpdate> {
    sensor: S,
}

impl<S: SensorUpdate> IspTask<S> {
    pub fn new(sensor: S) -> Self {
        Self { sensor }
    }

    pub async fn step<M: RawMutex, B: Copy>(&mut self, pipeline: &Pipeline<M, B>) {
        pipeline.wait_vsync().await;
        self.sensor.update();
    }

    pub async fn run<M: RawMutex, B: Copy>(mut self, pipeline: &Pipeline<M, B>) {
        loop {
            self.step(pipeline).await;
        }
    }
}
