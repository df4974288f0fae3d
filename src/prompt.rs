use crate::error::{ReelError, ReelResult};

/// Expand a scene description into one prompt per frame.
///
/// Frame `i` of `num_frames` gets a time-of-day clause at
/// `i / num_frames * 24` hours, formatted to one decimal place, so a
/// description sweeps a full day across its frame range.
pub fn expand_prompts(description: &str, num_frames: u32) -> ReelResult<Vec<String>> {
    if num_frames == 0 {
        return Err(ReelError::validation(
            "num_frames must be >= 1 (a description expands to at least one prompt)",
        ));
    }

    let mut prompts = Vec::with_capacity(num_frames as usize);
    for i in 0..num_frames {
        let hour = f64::from(i) / f64::from(num_frames) * 24.0;
        prompts.push(format!("{description}, time of day: {hour:.1} hours"));
    }
    Ok(prompts)
}
