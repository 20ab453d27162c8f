use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hand_core::{ClampPolicy, FrameBounds, RotationMode};
use hand_sim::{SimConfig, SimPipeline};
use static_cell::StaticCell;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Rotation {
    /// Axis-aligned crops only
    Snapped,
    /// Crops follow the hand angle
    Free,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Clamp {
    /// Drop the hand when its crop leaves the frame
    Abandon,
    /// Crop the visible part only
    PartialResize,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Hand tracking pipeline simulator", long_about = None)]
struct Args {
    /// Inference cycles to run
    #[arg(short, long, default_value_t = 300)]
    frames: u32,

    /// Camera frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,

    #[arg(long, default_value_t = 800)]
    width: i32,

    #[arg(long, default_value_t = 480)]
    height: i32,

    #[arg(short, long, value_enum, default_value_t = Rotation::Snapped)]
    rotation: Rotation,

    #[arg(short, long, value_enum, default_value_t = Clamp::Abandon)]
    clamp_policy: Clamp,

    /// Frames the displayed image lags behind capture
    #[arg(long, default_value_t = 1)]
    display_delay: usize,

    /// Scene seed
    #[arg(short, long, default_value_t = 1)]
    seed: u32,

    /// Print every rendered snapshot as one JSON line
    #[arg(short, long)]
    json: bool,

    /// Enable debug logging and the debug overlay text
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn sim_config(&self) -> SimConfig {
        SimConfig {
            frames: self.frames,
            fps: self.fps,
            bounds: FrameBounds::new(self.width, self.height),
            rotation_mode: match self.rotation {
                Rotation::Snapped => RotationMode::Snapped,
                Rotation::Free => RotationMode::Free,
            },
            clamp_policy: match self.clamp_policy {
                Clamp::Abandon => ClampPolicy::Abandon,
                Clamp::PartialResize => ClampPolicy::PartialResize,
            },
            display_delay: self.display_delay,
            seed: self.seed,
            debug_overlay: self.debug,
        }
    }
}

static PIPELINE: StaticCell<SimPipeline> = StaticCell::new();

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env().filter_level(level).init();

    if args.width <= 0 || args.height <= 0 {
        anyhow::bail!("Frame size must be positive, got {}x{}", args.width, args.height);
    }

    let config = args.sim_config();
    log::info!("Hand tracking simulator starting...");
    log::info!(
        "{} cycles at {} fps, {:?} rotation, {:?} clamp policy, seed {}",
        config.frames,
        config.fps,
        config.rotation_mode,
        config.clamp_policy,
        config.seed
    );

    let pipeline: &'static SimPipeline = PIPELINE.init(hand_sim::new_pipeline(&config)?);

    let json = args.json;
    let summary = hand_sim::run(config, pipeline, |info, compositor| {
        if json {
            match info.to_json() {
                Ok(line) => println!("{}", line),
                Err(e) => log::warn!("Failed to serialize snapshot: {}", e),
            }
        } else {
            log::info!(
                "frame {:>4}: fingers {:>2}, pd {:>2}ms, hl {:>2}ms, disp {:>2}ms, layer {}",
                info.report.cycle,
                info.report.finger_count,
                info.report.pd_ms,
                info.report.hl_ms,
                info.disp_ms,
                compositor.commits() % 2
            );
        }
    })
    .await
    .context("Simulation failed")?;

    log::info!(
        "{} cycles, hand tracked in {}, acquired {} times, lost {} times",
        summary.cycles,
        summary.tracked_cycles,
        summary.acquisitions,
        summary.losses
    );
    log::info!("finger counts 0..=5: {:?}", summary.finger_counts);

    Ok(())
}
