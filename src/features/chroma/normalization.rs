//! Chroma normalization

const EPSILON: f32 = 1e-10;

/// Scale a chroma frame so its largest element is 1.0 (L∞ normalization)
///
/// Frames whose maximum is below 1e-10 are set to zero instead, so silent
/// frames contribute nothing to the time average.
pub fn normalize_max(chroma: &mut [f32; 12]) {
    let max = chroma.iter().copied().fold(0.0f32, f32::max);
    if max < EPSILON {
        chroma.fill(0.0);
        return;
    }
    for value in chroma.iter_mut() {
        *value /= max;
    }
}

/// Average normalized chroma frames into one profile
///
/// Returns all zeros for an empty sequence.
pub fn mean_profile(frames: &[[f32; 12]]) -> [f32; 12] {
    let mut mean = [0.0f32; 12];
    if frames.is_empty() {
        return mean;
    }
    for frame in frames {
        for (acc, &value) in mean.iter_mut().zip(frame.iter()) {
            *acc += value;
        }
    }
    let scale = 1.0 / frames.len() as f32;
    for value in mean.iter_mut() {
        *value *= scale;
    }
    mean
}
