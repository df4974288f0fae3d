pub type ReelResult<T> = Result<T, ReelError>;

#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("model init error: {0}")]
    ModelInit(String),

    #[error("frame generation error: {0}")]
    FrameGeneration(String),

    #[error("empty frame set: {0}")]
    EmptyFrameSet(String),

    #[error("clip open error: {0}")]
    ClipOpen(String),

    #[error("unwritable output: {0}")]
    UnwritableOutput(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn model_init(msg: impl Into<String>) -> Self {
        Self::ModelInit(msg.into())
    }

    pub fn frame_generation(msg: impl Into<String>) -> Self {
        Self::FrameGeneration(msg.into())
    }

    pub fn empty_frame_set(msg: impl Into<String>) -> Self {
        Self::EmptyFrameSet(msg.into())
    }

    pub fn clip_open(msg: impl Into<String>) -> Self {
        Self::ClipOpen(msg.into())
    }

    pub fn unwritable_output(msg: impl Into<String>) -> Self {
        Self::UnwritableOutput(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ReelError::model_init("x")
                .to_string()
                .contains("model init error:")
        );
        assert!(
            ReelError::frame_generation("x")
                .to_string()
                .contains("frame generation error:")
        );
        assert!(
            ReelError::empty_frame_set("x")
                .to_string()
                .contains("empty frame set:")
        );
        assert!(
            ReelError::clip_open("x")
                .to_string()
                .contains("clip open error:")
        );
        assert!(
            ReelError::validation("x")
                .to_string()
                .contains("validation error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ReelError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
