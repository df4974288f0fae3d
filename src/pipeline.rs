use std::path::PathBuf;

use tracing::warn;

use crate::{
    encode::encode_frames_dir,
    error::{ReelError, ReelResult},
    frame_store,
    generate::{GenerateStats, TextToImage, generate_video_frames},
    merge::{MergeStats, merge_clips},
    runlog::RunLog,
};

/// Fixed configuration for one end-to-end run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Scene descriptions, processed in order.
    pub descriptions: Vec<String>,
    /// Frames generated per description.
    pub num_frames: u32,
    /// Nominal frame rate for every encoded clip and the merged output.
    pub fps: u32,
    /// Final merged video path.
    pub out_path: PathBuf,
    /// Directory holding per-description frame dirs, clips, and the run log.
    pub work_dir: PathBuf,
}

impl PipelineConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.descriptions.is_empty() {
            return Err(ReelError::validation(
                "pipeline needs at least one description",
            ));
        }
        if self.num_frames == 0 {
            return Err(ReelError::validation("num_frames must be >= 1"));
        }
        if self.fps == 0 {
            return Err(ReelError::validation("fps must be >= 1"));
        }
        Ok(())
    }
}

/// What happened to one description.
#[derive(Clone, Debug)]
pub struct DescriptionOutcome {
    pub description: String,
    pub frames_dir: PathBuf,
    pub generate: GenerateStats,
    /// `None` when the description contributed no clip (no frames survived
    /// generation, or the encode failed).
    pub clip: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct PipelineReport {
    pub outcomes: Vec<DescriptionOutcome>,
    pub merge: MergeStats,
    pub out_path: PathBuf,
}

/// Drive the whole run: per description, expand prompts, generate and store
/// frames, encode the frame set into a clip; then merge every produced clip
/// into `cfg.out_path`.
///
/// Everything is sequential and blocking; the one model handle is reused
/// across all frames of all descriptions. Per-frame generation failures and
/// per-description encode failures are recorded and skipped so the run still
/// produces a best-effort merged video. Producing zero clips is the one
/// run-level failure.
#[tracing::instrument(skip(model, cfg, log))]
pub fn run_pipeline(
    model: &dyn TextToImage,
    cfg: &PipelineConfig,
    log: &mut RunLog,
) -> ReelResult<PipelineReport> {
    cfg.validate()?;
    frame_store::ensure_dir(&cfg.work_dir)?;

    let mut outcomes = Vec::with_capacity(cfg.descriptions.len());
    let mut clips = Vec::new();

    for description in &cfg.descriptions {
        let dir_name = frame_store::frames_dir_name(description);
        let frames_dir = cfg.work_dir.join(&dir_name);
        frame_store::ensure_dir(&frames_dir)?;

        log.record(&format!("Generating frames for: {description}"))?;
        let generate = generate_video_frames(model, description, cfg.num_frames, &frames_dir)?;
        log.record(&format!(
            "Generated {}/{} frames for: {description}",
            generate.frames_written, generate.frames_requested
        ))?;

        let clip_path = cfg.work_dir.join(format!("{dir_name}.mp4"));
        let clip = match encode_frames_dir(&frames_dir, &clip_path, cfg.fps) {
            Ok(()) => {
                log.record(&format!("Video saved at {}", clip_path.display()))?;
                clips.push(clip_path.clone());
                Some(clip_path)
            }
            Err(e) => {
                warn!(%description, error = %e, "description contributed no clip");
                log.record(&format!("No clip for '{description}': {e}"))?;
                None
            }
        };

        outcomes.push(DescriptionOutcome {
            description: description.clone(),
            frames_dir,
            generate,
            clip,
        });
    }

    if clips.is_empty() {
        return Err(ReelError::empty_frame_set(
            "no description produced a clip; nothing to merge",
        ));
    }

    log.record(&format!(
        "Merging {} videos into {}",
        clips.len(),
        cfg.out_path.display()
    ))?;
    let merge = merge_clips(&clips, &cfg.out_path, cfg.fps)?;
    log.record(&format!(
        "Final merged video saved at {} ({} frames)",
        cfg.out_path.display(),
        merge.frames_written
    ))?;
    log.record("Process completed successfully.")?;

    Ok(PipelineReport {
        outcomes,
        merge,
        out_path: cfg.out_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cfg() -> PipelineConfig {
        PipelineConfig {
            descriptions: vec!["Rain".to_string()],
            num_frames: 4,
            fps: 1,
            out_path: PathBuf::from("generated_video.mp4"),
            work_dir: PathBuf::from("."),
        }
    }

    #[test]
    fn config_validation_catches_bad_values() {
        assert!(base_cfg().validate().is_ok());

        let mut cfg = base_cfg();
        cfg.descriptions.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = base_cfg();
        cfg.num_frames = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base_cfg();
        cfg.fps = 0;
        assert!(cfg.validate().is_err());
    }
}
