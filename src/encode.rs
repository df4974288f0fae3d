use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use anyhow::Context as _;
use image::RgbaImage;

use crate::{
    error::{ReelError, ReelResult},
    frame_store,
};

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(ReelError::validation("encode fps must be non-zero"));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            // With the default settings we target yuv420p output for maximum compatibility.
            return Err(ReelError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streaming MP4 writer over a spawned `ffmpeg` child.
///
/// Raw RGBA frames are piped to stdin; ffmpeg encodes libx264/yuv420p. Every
/// appended frame must match the configured geometry exactly. The child is
/// killed on drop if the writer was not finished, so an early-return failure
/// path never leaks a half-open encoder.
pub struct VideoWriter {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    finished: bool,
}

impl VideoWriter {
    pub fn open(cfg: EncodeConfig) -> ReelResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(ReelError::unwritable_output(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(ReelError::unwritable_output(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        // System `ffmpeg` rather than linked FFmpeg libraries, to avoid
        // native dev header/lib requirements.
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::unwritable_output(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ReelError::unwritable_output("failed to open ffmpeg stdin (unexpected)")
        })?;

        Ok(Self {
            cfg,
            child,
            stdin: Some(stdin),
            finished: false,
        })
    }

    /// Append one frame, rejecting any geometry drift from the first frame.
    pub fn append_frame(&mut self, frame: &RgbaImage) -> ReelResult<()> {
        let (w, h) = frame.dimensions();
        if w != self.cfg.width || h != self.cfg.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {w}x{h}, expected {}x{}",
                self.cfg.width, self.cfg.height
            )));
        }
        self.append_frame_rgba8(frame.as_raw())
    }

    /// Append one frame from a raw RGBA8 buffer of exactly width*height*4 bytes.
    pub fn append_frame_rgba8(&mut self, data: &[u8]) -> ReelResult<()> {
        let expected = self.cfg.width as usize * self.cfg.height as usize * 4;
        if data.len() != expected {
            return Err(ReelError::validation(format!(
                "frame buffer size mismatch: got {} bytes, expected {expected}",
                data.len()
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::unwritable_output(
                "video writer is already finalized",
            ));
        };

        use std::io::Write as _;
        stdin.write_all(data).map_err(|e| {
            ReelError::unwritable_output(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        Ok(())
    }

    /// Close stdin, wait for ffmpeg, and surface its stderr on failure.
    pub fn finish(mut self) -> ReelResult<()> {
        drop(self.stdin.take());
        self.finished = true;

        // Drain stderr before waiting so the child can never block on a
        // full pipe.
        let mut stderr_text = String::new();
        if let Some(mut stderr) = self.child.stderr.take() {
            use std::io::Read as _;
            let _ = stderr.read_to_string(&mut stderr_text);
        }

        let status = self.child.wait().map_err(|e| {
            ReelError::unwritable_output(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !status.success() {
            return Err(ReelError::unwritable_output(format!(
                "ffmpeg exited with status {status}: {}",
                stderr_text.trim()
            )));
        }

        Ok(())
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        if !self.finished {
            drop(self.stdin.take());
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Encode every frame file in `frames_dir` into `out_path` at `fps`.
///
/// The first frame fixes the clip geometry; a later frame with different
/// geometry, or a frame file that cannot be read, fails the whole encode
/// (a half-encoded set would break the ordering downstream merges rely on).
/// An empty directory is an [`ReelError::EmptyFrameSet`] and produces no
/// output file at all.
pub fn encode_frames_dir(frames_dir: &Path, out_path: &Path, fps: u32) -> ReelResult<()> {
    let frame_paths = frame_store::list_frames(frames_dir)?;
    if frame_paths.is_empty() {
        return Err(ReelError::empty_frame_set(format!(
            "no frames to encode in '{}'",
            frames_dir.display()
        )));
    }

    let first = frame_store::load_frame(&frame_paths[0])?;
    let (width, height) = first.dimensions();

    let cfg = EncodeConfig {
        width,
        height,
        fps,
        out_path: out_path.to_path_buf(),
        overwrite: true,
    };

    let result = (|| {
        let mut writer = VideoWriter::open(cfg)?;
        writer.append_frame(&first)?;
        for path in &frame_paths[1..] {
            let frame = frame_store::load_frame(path)?;
            let (w, h) = frame.dimensions();
            if (w, h) != (width, height) {
                return Err(ReelError::validation(format!(
                    "frame '{}' geometry {w}x{h} differs from clip geometry {width}x{height}",
                    path.display()
                )));
            }
            writer.append_frame(&frame)?;
        }
        writer.finish()
    })();

    if result.is_err() {
        // A partially written clip must not survive to the merge step.
        let _ = std::fs::remove_file(out_path);
    }
    result
}
