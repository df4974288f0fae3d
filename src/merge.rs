use std::{
    io::Read as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Command, Stdio},
};

use tracing::warn;

use crate::{
    encode::{EncodeConfig, VideoWriter},
    error::{ReelError, ReelResult},
};

/// Stream geometry of an encoded clip, from ffprobe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipInfo {
    pub width: u32,
    pub height: u32,
}

pub fn is_ffprobe_on_path() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Probe a clip's video stream geometry with ffprobe.
pub fn probe_clip(path: &Path) -> ReelResult<ClipInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(path)
        .output()
        .map_err(|e| ReelError::clip_open(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::clip_open(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReelError::clip_open(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            ReelError::clip_open(format!("no video stream in '{}'", path.display()))
        })?;
    let width = video.width.ok_or_else(|| {
        ReelError::clip_open(format!("missing video width for '{}'", path.display()))
    })?;
    let height = video.height.ok_or_else(|| {
        ReelError::clip_open(format!("missing video height for '{}'", path.display()))
    })?;

    Ok(ClipInfo { width, height })
}

/// Streaming RGBA frame reader over a spawned `ffmpeg` decode child.
///
/// Frames come back in native decode order until end of stream. The child is
/// killed on drop if the reader was not closed.
pub struct ClipReader {
    path: PathBuf,
    frame_len: usize,
    child: Child,
    stdout: Option<ChildStdout>,
    closed: bool,
}

impl ClipReader {
    pub fn open(path: &Path, info: ClipInfo) -> ReelResult<Self> {
        let frame_len = info.width as usize * info.height as usize * 4;
        if frame_len == 0 {
            return Err(ReelError::clip_open(format!(
                "clip '{}' has zero-sized frames",
                path.display()
            )));
        }

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                ReelError::clip_open(format!("failed to run ffmpeg for video decode: {e}"))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ReelError::clip_open("failed to open ffmpeg stdout (unexpected)")
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            frame_len,
            child,
            stdout: Some(stdout),
            closed: false,
        })
    }

    /// Read the next frame as raw RGBA8 bytes, or `None` at end of stream.
    /// A truncated trailing frame is an error, not a short frame.
    pub fn read_next_frame(&mut self) -> ReelResult<Option<Vec<u8>>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; self.frame_len];
        let mut filled = 0usize;
        while filled < buf.len() {
            match stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(ReelError::clip_open(format!(
                        "failed to read decoded frame from '{}': {e}",
                        self.path.display()
                    )));
                }
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < buf.len() {
            return Err(ReelError::clip_open(format!(
                "truncated frame in '{}': got {filled} bytes, expected {}",
                self.path.display(),
                self.frame_len
            )));
        }
        Ok(Some(buf))
    }

    /// Drain the child and surface a decode failure.
    pub fn close(mut self) -> ReelResult<()> {
        drop(self.stdout.take());
        self.closed = true;
        let status = self.child.wait().map_err(|e| {
            ReelError::clip_open(format!("failed to wait for ffmpeg decode: {e}"))
        })?;
        if !status.success() {
            return Err(ReelError::clip_open(format!(
                "ffmpeg decode of '{}' exited with status {status}",
                self.path.display()
            )));
        }
        Ok(())
    }
}

impl Drop for ClipReader {
    fn drop(&mut self) {
        if !self.closed {
            drop(self.stdout.take());
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Per-merge accounting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub frames_written: u64,
    pub clips_merged: usize,
    pub clips_skipped: Vec<PathBuf>,
}

/// Concatenate `clip_paths` frame-for-frame into `out_path` at `fps`.
///
/// The first clip is authoritative: if it cannot be probed the whole merge
/// fails and no output file is produced. Any later clip that fails to open,
/// or whose geometry differs from the first clip's, is logged and skipped.
/// `fps` is the nominal output rate; source rates are ignored and frames are
/// copied 1:1 with no retiming or duplication.
pub fn merge_clips(clip_paths: &[PathBuf], out_path: &Path, fps: u32) -> ReelResult<MergeStats> {
    let Some(first_path) = clip_paths.first() else {
        return Err(ReelError::validation("merge requires at least one clip"));
    };

    // Fatal: the first clip fixes the output geometry.
    let first_info = probe_clip(first_path)?;

    let cfg = EncodeConfig {
        width: first_info.width,
        height: first_info.height,
        fps,
        out_path: out_path.to_path_buf(),
        overwrite: true,
    };
    let mut writer = VideoWriter::open(cfg)?;
    let mut stats = MergeStats::default();

    for path in clip_paths {
        let info = match probe_clip(path) {
            Ok(info) => info,
            Err(e) => {
                warn!(clip = %path.display(), error = %e, "skipping clip: cannot open");
                stats.clips_skipped.push(path.clone());
                continue;
            }
        };
        if info != first_info {
            warn!(
                clip = %path.display(),
                got = %format_args!("{}x{}", info.width, info.height),
                expected = %format_args!("{}x{}", first_info.width, first_info.height),
                "skipping clip: geometry differs from first clip"
            );
            stats.clips_skipped.push(path.clone());
            continue;
        }

        let mut reader = match ClipReader::open(path, info) {
            Ok(reader) => reader,
            Err(e) => {
                warn!(clip = %path.display(), error = %e, "skipping clip: decode failed to start");
                stats.clips_skipped.push(path.clone());
                continue;
            }
        };
        while let Some(frame) = reader.read_next_frame()? {
            writer.append_frame_rgba8(&frame)?;
            stats.frames_written += 1;
        }
        reader.close()?;
        stats.clips_merged += 1;
    }

    writer.finish()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_clip_list_is_a_validation_error() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("merged.mp4");
        let err = merge_clips(&[], &out, 30).unwrap_err();
        assert!(matches!(err, ReelError::Validation(_)));
        assert!(!out.exists());
    }

    #[test]
    fn unopenable_first_clip_is_fatal_and_writes_nothing() {
        if !is_ffprobe_on_path() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing.mp4");
        let out = root.path().join("merged.mp4");
        let err = merge_clips(&[missing], &out, 30).unwrap_err();
        assert!(matches!(err, ReelError::ClipOpen(_)));
        assert!(!out.exists());
    }
}
