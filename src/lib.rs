#![forbid(unsafe_code)]

pub mod encode;
pub mod error;
pub mod frame_store;
pub mod generate;
pub mod merge;
pub mod pipeline;
pub mod prompt;
pub mod runlog;

pub use encode::{EncodeConfig, VideoWriter, encode_frames_dir, is_ffmpeg_on_path};
pub use error::{ReelError, ReelResult};
pub use frame_store::{ensure_dir, frames_dir_name, list_frames, write_frame};
pub use generate::{GenerateStats, ProceduralModel, TextToImage, generate_video_frames};
pub use merge::{ClipInfo, ClipReader, MergeStats, is_ffprobe_on_path, merge_clips, probe_clip};
pub use pipeline::{DescriptionOutcome, PipelineConfig, PipelineReport, run_pipeline};
pub use prompt::expand_prompts;
pub use runlog::RunLog;
