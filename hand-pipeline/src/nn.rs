//! Inference task: one tracking cycle per ready capture buffer.

use embassy_sync::blocking_mutex::raw::RawMutex;
use hand_core::{CyclePlan, HandTracker};
use hand_shared::CycleReport;

use crate::engine::{run_to_completion, Clock, DmaBarrier, LandmarkModel, PalmDetector, Region};
use crate::error::{halt, Fatal};
use crate::stats::CycleTimings;
use crate::Pipeline;

pub struct InferenceTask<P, L, K, X> {
    tracker: HandTracker,
    detector: P,
    landmark_model: L,
    clock: K,
    barrier: X,
    timings: CycleTimings,
    last_cycle_ms: u32,
    cycle: u32,
}

impl<P, L, K, X> InferenceTask<P, L, K, X>
where
    L: LandmarkModel,
    K: Clock,
    X: DmaBarrier,
{
    pub fn new(tracker: HandTracker, detector: P, landmark_model: L, clock: K, barrier: X, filtered: bool) -> Self {
        let last_cycle_ms = clock.now_ms();

        Self {
            tracker,
            detector,
            landmark_model,
            clock,
            barrier,
            timings: CycleTimings::new(filtered),
            last_cycle_ms,
            cycle: 0,
        }
    }

    pub fn tracker(&self) -> &HandTracker {
        &self.tracker
    }

    /// Processes one capture buffer and publishes the result
    pub async fn cycle<M: RawMutex, B: Copy>(&mut self, pipeline: &Pipeline<M, B>) -> Result<CycleReport, Fatal>
    where
        P: PalmDetector<B>,
    {
        let now = self.clock.now_ms();
        let nn_period_ms = self.timings.nn_period.update(now.wrapping_sub(self.last_cycle_ms) as f32);
        self.last_cycle_ms = now;

        let buffer = pipeline.queue.acquire_ready().await;
        let frame_idx = pipeline.capture.frame_for_resize();

        let pd_ms = match self.tracker.begin_cycle() {
            CyclePlan::Detect => {
                let start = self.clock.now_ms();
                self.detector.set_input(buffer)?;
                run_to_completion(&mut self.detector).await?;
                self.barrier.consume(Region::DetectorOutput);
                self.tracker.on_detections(&self.detector.detections());
                self.clock.now_ms().wrapping_sub(start)
            }
            CyclePlan::Track => 0,
        };
        let pd_filtered_ms = self.timings.pd.update(pd_ms as f32);
        pipeline.queue.release_as_free()?;

        let mut hl_ms = 0;
        if let Some(plan) = self.tracker.plan_crop() {
            let start = self.clock.now_ms();
            self.landmark_model.prepare_input(frame_idx, &plan)?;
            self.barrier.publish(Region::NnInput);
            run_to_completion(&mut self.landmark_model).await?;
            self.barrier.consume(Region::LandmarkOutput);

            let accepted = self
                .tracker
                .on_landmarks(self.landmark_model.probability(), &self.landmark_model.landmarks());
            let filtered = self.timings.hl.update(self.clock.now_ms().wrapping_sub(start) as f32);
            if accepted {
                hl_ms = filtered as u32;
            }
        }
        // the crop read the display frame, drop stale lines before the camera rewrites it
        self.barrier.consume(Region::Frame(frame_idx));

        let tracking = self.tracker.is_tracking();
        self.cycle = self.cycle.wrapping_add(1);
        let report = CycleReport {
            cycle: self.cycle,
            nn_period_ms,
            pd_ms: if tracking { 0 } else { pd_filtered_ms as u32 },
            hl_ms,
            pd_hand_nb: self.tracker.hand_count(),
            pd_max_prob: self.tracker.best_probability(),
            hands: [self.tracker.hand_info()],
            finger_count: self.tracker.finger_count(),
        };

        pipeline.display.publish(&report);

        Ok(report)
    }

    pub async fn run<M: RawMutex, B: Copy>(mut self, pipeline: &Pipeline<M, B>)
    where
        P: PalmDetector<B>,
    {
        loop {
            if let Err(fatal) = self.cycle(pipeline).await {
                halt(fatal);
            }
        }
    }
}
