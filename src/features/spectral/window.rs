//! Analysis windows

/// Periodic Hann window of length `len`
///
/// `w[n] = 0.5 - 0.5 * cos(2πn / len)`; the periodic form keeps overlapping
/// frames at hop `len / 4` summing to a constant.
pub fn hann_window(len: usize) -> Vec<f32> {
    if len == 0 {
        return Vec::new();
    }
    (0..len)
        .map(|n| {
            let phase = 2.0 * std::f64::consts::PI * n as f64 / len as f64;
            (0.5 - 0.5 * phase.cos()) as f32
        })
        .collect()
}

/// Time derivative of [`hann_window`], per sample
///
/// `w'[n] = (π / len) * sin(2πn / len)`. Used as the second window of the
/// frequency-reassigned STFT.
pub fn hann_derivative_window(len: usize) -> Vec<f32> {
    if len == 0 {
        return Vec::new();
    }
    let scale = std::f64::consts::PI / len as f64;
    (0..len)
        .map(|n| {
            let phase = 2.0 * std::f64::consts::PI * n as f64 / len as f64;
            (scale * phase.sin()) as f32
        })
        .collect()
}
