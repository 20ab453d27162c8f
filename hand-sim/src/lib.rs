//! Host simulator for the hand tracking pipeline.
//!
//! A camera thread plays the interrupt handlers over a synthetic scene while
//! the inference and display tasks run on a tokio runtime, talking to each
//! other only through the [`Pipeline`].

pub mod engines;
pub mod framebuffer;
pub mod rng;
pub mod scene;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use hand_core::{ClampPolicy, FrameBounds, HandTracker, RotationMode, TrackerConfig};
use hand_pipeline::button::NoButton;
use hand_pipeline::dp::DisplayTask;
use hand_pipeline::engine::{NoBarrier, StdClock};
use hand_pipeline::nn::InferenceTask;
use hand_pipeline::render::Renderer;
use hand_pipeline::{halt, Pipeline, PipelineConfig, BQUEUE_MAX_BUFFERS};
use hand_shared::{CycleReport, DisplayInfo};
use log::{debug, info};

use engines::{SensorMemory, SimCamera, SimDetector, SimLandmarkModel};
use framebuffer::SimCompositor;
use scene::HandScene;

pub type SimPipeline = Pipeline<CriticalSectionRawMutex, usize>;

#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// Inference cycles to run
    pub frames: u32,
    pub fps: u32,
    pub bounds: FrameBounds,
    pub rotation_mode: RotationMode,
    pub clamp_policy: ClampPolicy,
    pub display_delay: usize,
    pub seed: u32,
    pub debug_overlay: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frames: 300,
            fps: 30,
            bounds: FrameBounds::new(800, 480),
            rotation_mode: RotationMode::Snapped,
            clamp_policy: ClampPolicy::Abandon,
            display_delay: 1,
            seed: 1,
            debug_overlay: false,
        }
    }
}

impl SimConfig {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            bounds: self.bounds,
            display_delay: self.display_delay,
            filtered_timings: true,
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig::default()
            .with_bounds(self.bounds)
            .with_rotation_mode(self.rotation_mode)
            .with_clamp_policy(self.clamp_policy)
    }
}

/// Pipeline with one detector input buffer per queue slot
pub fn new_pipeline(config: &SimConfig) -> Result<SimPipeline> {
    let buffers: Vec<usize> = (0..BQUEUE_MAX_BUFFERS).collect();
    Pipeline::new(config.pipeline_config(), &buffers).context("Failed to create pipeline")
}

/// Tracking outcome over a run
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub cycles: u32,
    pub tracked_cycles: u32,
    pub acquisitions: u32,
    pub losses: u32,
    /// Cycles per reported finger count
    pub finger_counts: [u32; 6],
    pub last: CycleReport,
}

impl Summary {
    fn record(&mut self, report: &CycleReport) {
        let was_tracking = self.last.hands[0].is_valid;
        let tracking = report.hands[0].is_valid;

        self.cycles += 1;
        if tracking {
            self.tracked_cycles += 1;
            if !was_tracking {
                self.acquisitions += 1;
            }
        } else if was_tracking {
            self.losses += 1;
        }
        if let Some(count) = usize::try_from(report.finger_count).ok().and_then(|c| self.finger_counts.get_mut(c)) {
            *count += 1;
        }
        self.last = *report;
    }
}

/// Plays the camera interrupts over the scene until `stop` is set
fn spawn_camera(
    config: SimConfig,
    pipeline: &'static SimPipeline,
    mut camera: SimCamera,
    stop: Arc<AtomicBool>,
) -> Result<JoinHandle<u32>> {
    let period = Duration::from_secs(1) / config.fps.max(1);

    std::thread::Builder::new()
        .name("camera".into())
        .spawn(move || {
            let mut scene = HandScene::new(config.seed, config.bounds);
            while !stop.load(Ordering::Relaxed) {
                scene.step();
                camera.capture(scene.landmarks());

                pipeline.on_vsync();
                if let Err(fatal) = pipeline
                    .on_primary_frame(&mut camera)
                    .and_then(|_| pipeline.on_auxiliary_frame(&mut camera))
                {
                    halt(fatal);
                }

                std::thread::sleep(period);
            }
            scene.frame()
        })
        .context("Failed to spawn camera thread")
}

/// Runs `config.frames` inference cycles. `on_render` sees every snapshot the
/// display task draws, along with the compositor it drew into.
pub async fn run<F>(config: SimConfig, pipeline: &'static SimPipeline, mut on_render: F) -> Result<Summary>
where
    F: FnMut(&DisplayInfo, &SimCompositor),
{
    let memory = Arc::new(SensorMemory::new(BQUEUE_MAX_BUFFERS, pipeline.capture.ring()));
    let mut camera = SimCamera::new(memory.clone());
    pipeline.start(&mut camera).context("Failed to start camera pipes")?;

    let tracker_config = config.tracker_config();
    let mut inference = InferenceTask::new(
        HandTracker::new(tracker_config),
        SimDetector::new(memory.clone(), config.bounds),
        SimLandmarkModel::new(memory, tracker_config.landmark_input_size),
        StdClock::new(),
        NoBarrier,
        pipeline.config().filtered_timings,
    );
    let mut display = DisplayTask::new(
        SimCompositor::new(config.bounds.width as u32, config.bounds.height as u32),
        Renderer::new(config.bounds).with_debug(config.debug_overlay),
        StdClock::new(),
        NoBarrier,
        NoButton,
        NoButton,
    );

    let stop = Arc::new(AtomicBool::new(false));
    let camera_thread = spawn_camera(config, pipeline, camera, stop.clone())?;

    let inferring = async {
        let mut summary = Summary::default();
        for _ in 0..config.frames {
            let report = inference.cycle(pipeline).await?;
            debug!(
                "cycle {}: fingers {} pd {}ms hl {}ms",
                report.cycle, report.finger_count, report.pd_ms, report.hl_ms
            );
            summary.record(&report);
        }
        Ok::<_, hand_pipeline::Fatal>(summary)
    };
    let rendering = async {
        loop {
            match display.step(pipeline).await {
                Ok(info) => on_render(&info, display.compositor()),
                Err(fatal) => break fatal,
            }
        }
    };

    let outcome = tokio::select! {
        summary = inferring => summary.context("Inference task failed"),
        fatal = rendering => Err(anyhow::Error::new(fatal).context("Display task failed")),
    };

    stop.store(true, Ordering::Relaxed);
    let camera_frames = camera_thread.join().map_err(|_| anyhow!("Camera thread panicked"))?;
    info!("camera produced {} frames", camera_frames);

    outcome
}
