use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

/// Default scene list, frame count, and rate for a run with no arguments.
const DEFAULT_DESCRIPTIONS: &[&str] = &[
    "Walk through a rainy street in a quiet town",
    "Sit by a window on a rainy day, watching the rain fall on the streets",
    "Walk along a cobblestone street on a rainy evening",
];
const DEFAULT_NUM_FRAMES: u32 = 10;
const DEFAULT_FPS: u32 = 1;

#[derive(Parser, Debug)]
#[command(name = "promptreel", version)]
#[command(about = "Generate per-prompt frames and assemble them into one merged MP4")]
struct Cli {
    /// Scene descriptions; repeat the flag for multiple scenes.
    #[arg(long = "describe")]
    descriptions: Vec<String>,

    /// Frames to generate per description.
    #[arg(long, default_value_t = DEFAULT_NUM_FRAMES)]
    frames: u32,

    /// Frame rate of every clip and of the merged output.
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// Final merged video path.
    #[arg(long, default_value = "generated_video.mp4")]
    out: PathBuf,

    /// Working directory for frame dirs, per-description clips, and the run log.
    #[arg(long = "work-dir", default_value = ".")]
    work_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let descriptions = if cli.descriptions.is_empty() {
        DEFAULT_DESCRIPTIONS.iter().map(|s| s.to_string()).collect()
    } else {
        cli.descriptions
    };

    let cfg = promptreel::PipelineConfig {
        descriptions,
        num_frames: cli.frames,
        fps: cli.fps,
        out_path: cli.out,
        work_dir: cli.work_dir,
    };

    promptreel::ensure_dir(&cfg.work_dir)?;
    let mut log = promptreel::RunLog::create(&cfg.work_dir)?;
    eprintln!("logging to {}", log.path().display());

    let model = promptreel::ProceduralModel::load(
        promptreel::ProceduralModel::DEFAULT_WIDTH,
        promptreel::ProceduralModel::DEFAULT_HEIGHT,
    )
    .context("initialize image generator")?;

    let report = promptreel::run_pipeline(&model, &cfg, &mut log)?;

    for outcome in &report.outcomes {
        match &outcome.clip {
            Some(clip) => eprintln!(
                "{}: {}/{} frames -> {}",
                outcome.description,
                outcome.generate.frames_written,
                outcome.generate.frames_requested,
                clip.display()
            ),
            None => eprintln!("{}: no clip produced", outcome.description),
        }
    }
    eprintln!(
        "wrote {} ({} frames)",
        report.out_path.display(),
        report.merge.frames_written
    );
    Ok(())
}
