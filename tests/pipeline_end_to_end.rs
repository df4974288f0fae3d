use image::RgbaImage;
use promptreel::{
    PipelineConfig, ProceduralModel, ReelError, ReelResult, RunLog, TextToImage, run_pipeline,
};

fn ffmpeg_tools_available() -> bool {
    promptreel::is_ffmpeg_on_path() && promptreel::is_ffprobe_on_path()
}

/// Delegates to the procedural model but refuses any prompt mentioning a
/// storm, standing in for a model that fails on some scenes.
struct StormAverseModel {
    inner: ProceduralModel,
}

impl TextToImage for StormAverseModel {
    fn text_to_image(&self, prompt: &str) -> ReelResult<RgbaImage> {
        if prompt.contains("storm") {
            return Err(ReelError::frame_generation("refusing storm scenes"));
        }
        self.inner.text_to_image(prompt)
    }
}

#[test]
fn full_run_produces_clips_log_and_merged_video() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig {
        descriptions: vec![
            "Walk through a rainy street in a quiet town".to_string(),
            "Sit by a window on a rainy day".to_string(),
        ],
        num_frames: 3,
        fps: 30,
        out_path: root.path().join("generated_video.mp4"),
        work_dir: root.path().to_path_buf(),
    };

    let model = ProceduralModel::load(64, 64).unwrap();
    let mut log = RunLog::create(root.path()).unwrap();
    let report = run_pipeline(&model, &cfg, &mut log).unwrap();

    assert_eq!(report.outcomes.len(), 2);
    for outcome in &report.outcomes {
        assert_eq!(outcome.generate.frames_written, 3);
        assert!(outcome.clip.as_ref().is_some_and(|c| c.exists()));
        assert!(outcome.frames_dir.is_dir());
        assert!(
            outcome
                .frames_dir
                .file_name()
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("video_frames_")
        );
    }
    assert_eq!(report.merge.frames_written, 6);
    assert!(report.out_path.exists());

    let info = promptreel::probe_clip(&report.out_path).unwrap();
    assert_eq!((info.width, info.height), (64, 64));

    let log_text = std::fs::read_to_string(log.path()).unwrap();
    assert!(log_text.contains("Generating frames for: Walk through a rainy street"));
    assert!(log_text.contains("Process completed successfully."));
}

#[test]
fn description_with_no_surviving_frames_is_skipped_not_fatal() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig {
        descriptions: vec![
            "A violent storm over the harbor".to_string(),
            "Sit by a window on a rainy day".to_string(),
        ],
        num_frames: 3,
        fps: 30,
        out_path: root.path().join("generated_video.mp4"),
        work_dir: root.path().to_path_buf(),
    };

    let model = StormAverseModel {
        inner: ProceduralModel::load(64, 64).unwrap(),
    };
    let mut log = RunLog::create(root.path()).unwrap();
    let report = run_pipeline(&model, &cfg, &mut log).unwrap();

    assert!(report.outcomes[0].clip.is_none());
    assert_eq!(report.outcomes[0].generate.frames_skipped, 3);
    assert!(report.outcomes[1].clip.is_some());
    assert_eq!(report.merge.frames_written, 3);
    assert!(report.out_path.exists());

    let log_text = std::fs::read_to_string(log.path()).unwrap();
    assert!(log_text.contains("No clip for 'A violent storm over the harbor'"));
}

#[test]
fn run_with_zero_clips_is_a_named_failure() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig {
        descriptions: vec!["A violent storm over the harbor".to_string()],
        num_frames: 2,
        fps: 30,
        out_path: root.path().join("generated_video.mp4"),
        work_dir: root.path().to_path_buf(),
    };

    let model = StormAverseModel {
        inner: ProceduralModel::load(64, 64).unwrap(),
    };
    let mut log = RunLog::create(root.path()).unwrap();
    let err = run_pipeline(&model, &cfg, &mut log).unwrap_err();
    assert!(matches!(err, ReelError::EmptyFrameSet(_)));
    assert!(!cfg.out_path.exists());
}

#[test]
fn rerunning_over_an_existing_work_dir_succeeds() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig {
        descriptions: vec!["Rain".to_string()],
        num_frames: 2,
        fps: 30,
        out_path: root.path().join("generated_video.mp4"),
        work_dir: root.path().to_path_buf(),
    };

    let model = ProceduralModel::load(64, 64).unwrap();
    let mut log = RunLog::create(root.path()).unwrap();
    // Frame dirs, clips, and the merged output all exist on the second run.
    run_pipeline(&model, &cfg, &mut log).unwrap();
    let report = run_pipeline(&model, &cfg, &mut log).unwrap();
    assert_eq!(report.merge.frames_written, 2);
}
