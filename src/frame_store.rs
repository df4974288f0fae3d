use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbaImage;

use crate::error::{ReelError, ReelResult};

/// Frames are persisted as PNG so listing can filter on one extension.
pub const FRAME_EXT: &str = "png";

/// Description prefix length used for directory naming.
const DIR_KEY_LEN: usize = 10;

/// Derive the per-description frames directory name:
/// `video_frames_<prefix>` where the prefix is the first [`DIR_KEY_LEN`]
/// characters of the description with whitespace mapped to `_` and path
/// separators dropped. Truncation respects char boundaries.
pub fn frames_dir_name(description: &str) -> String {
    let prefix: String = description
        .chars()
        .take(DIR_KEY_LEN)
        .filter(|c| *c != '/' && *c != '\\')
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("video_frames_{prefix}")
}

/// Create `dir` (and parents) if absent. Idempotent: an existing directory
/// is a no-op, not an error.
pub fn ensure_dir(dir: &Path) -> ReelResult<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create frames directory '{}'", dir.display()))?;
    Ok(())
}

/// Path of frame `index` inside `dir`. Zero-padded to three digits so the
/// lexical sort of filenames matches index order.
pub fn frame_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("frame_{index:03}.{FRAME_EXT}"))
}

/// Persist one frame as `frame_<index>.png` inside `dir`.
pub fn write_frame(dir: &Path, index: u32, image: &RgbaImage) -> ReelResult<PathBuf> {
    let path = frame_path(dir, index);
    image::save_buffer_with_format(
        &path,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| {
        ReelError::unwritable_output(format!("failed to write frame '{}': {e}", path.display()))
    })?;
    Ok(path)
}

/// List frame files in `dir`, sorted by filename. With the fixed-width
/// naming this is ascending index order, gaps included. An empty result is
/// not an error here; the encoder decides whether that is fatal.
pub fn list_frames(dir: &Path) -> ReelResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read frames directory '{}'", dir.display()))?;

    let mut frames = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in '{}'", dir.display()))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(FRAME_EXT) {
            frames.push(path);
        }
    }
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}

/// Load a frame back as RGBA8.
pub fn load_frame(path: &Path) -> ReelResult<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to read frame '{}'", path.display()))?;
    Ok(img.to_rgba8())
}
