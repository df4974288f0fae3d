use std::path::Path;

use image::RgbaImage;
use sha2::Digest as _;
use tracing::warn;

use crate::{
    error::{ReelError, ReelResult},
    frame_store,
    prompt::expand_prompts,
};

/// The text-to-image collaborator. One prompt in, one raster frame out.
///
/// Model choice, sampling parameters, and device placement all live behind
/// this seam; the pipeline only ever sees a fallible `prompt -> image` call.
/// The handle is initialized once per run and reused sequentially, so
/// implementations do not need interior synchronization.
pub trait TextToImage {
    fn text_to_image(&self, prompt: &str) -> ReelResult<RgbaImage>;
}

/// Outcome of one per-description generation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub frames_requested: u32,
    pub frames_written: u32,
    pub frames_skipped: u32,
}

/// Generate and persist one frame per expanded prompt into `dir`.
///
/// A failed generation (or an unwritable frame file) skips that index and
/// continues; the resulting frame set may have gaps. Only prompt expansion
/// itself can fail the whole call.
pub fn generate_video_frames(
    model: &dyn TextToImage,
    description: &str,
    num_frames: u32,
    dir: &Path,
) -> ReelResult<GenerateStats> {
    let prompts = expand_prompts(description, num_frames)?;

    let mut stats = GenerateStats {
        frames_requested: num_frames,
        ..GenerateStats::default()
    };

    for (i, prompt) in prompts.iter().enumerate() {
        let index = i as u32;
        let image = match model.text_to_image(prompt) {
            Ok(image) => image,
            Err(e) => {
                warn!(index, %prompt, error = %e, "skipping frame: generation failed");
                stats.frames_skipped += 1;
                continue;
            }
        };
        match frame_store::write_frame(dir, index, &image) {
            Ok(_) => stats.frames_written += 1,
            Err(e) => {
                warn!(index, error = %e, "skipping frame: write failed");
                stats.frames_skipped += 1;
            }
        }
    }

    Ok(stats)
}

/// Deterministic stand-in for a generative model.
///
/// Renders a gradient whose phase is seeded by a SHA-256 of the prompt, so
/// the same prompt always yields the same pixels and different prompts are
/// visually distinct. Frame geometry is fixed at construction.
pub struct ProceduralModel {
    width: u32,
    height: u32,
}

impl ProceduralModel {
    /// Fixed default geometry, small enough for fast end-to-end runs.
    pub const DEFAULT_WIDTH: u32 = 64;
    pub const DEFAULT_HEIGHT: u32 = 64;

    pub fn load(width: u32, height: u32) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::model_init(
                "frame width/height must be non-zero",
            ));
        }
        // mp4 output targets yuv420p, which needs even dimensions.
        if width % 2 != 0 || height % 2 != 0 {
            return Err(ReelError::model_init(
                "frame width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(Self { width, height })
    }

    fn seed(prompt: &str) -> [u8; 3] {
        let digest = sha2::Sha256::digest(prompt.as_bytes());
        [digest[0], digest[1], digest[2]]
    }
}

impl TextToImage for ProceduralModel {
    fn text_to_image(&self, prompt: &str) -> ReelResult<RgbaImage> {
        let [sr, sg, sb] = Self::seed(prompt);
        let (w, h) = (self.width, self.height);
        Ok(RgbaImage::from_fn(w, h, |x, y| {
            let gx = (x * 255 / w.max(1)) as u8;
            let gy = (y * 255 / h.max(1)) as u8;
            image::Rgba([
                sr.wrapping_add(gx),
                sg.wrapping_add(gy),
                sb.wrapping_add(gx ^ gy),
                255,
            ])
        }))
    }
}
