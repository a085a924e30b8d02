//! K-weighting pre-filter (ITU-R BS.1770-4)
//!
//! Two cascaded biquads:
//! 1. High shelf of about +4 dB above ~1.7 kHz (head acoustics)
//! 2. RLB high-pass at about 38 Hz
//!
//! Coefficients are derived for any sample rate by bilinear transform from the
//! analog prototypes, using the same constants as libebur128, so at 48 kHz they
//! reproduce the tabulated BS.1770 coefficients.
//!
//! # Reference
//!
//! ITU-R BS.1770-4 (2015). Algorithms to measure audio programme loudness and true-peak audio level.
//! International Telecommunication Union.

use std::f64::consts::PI;

const SHELF_FREQUENCY: f64 = 1_681.974_450_955_533;
const SHELF_GAIN_DB: f64 = 3.999_843_853_973_347;
const SHELF_Q: f64 = 0.707_175_236_955_419_6;
const SHELF_BAND_EXPONENT: f64 = 0.499_666_774_154_541_6;

const HIGHPASS_FREQUENCY: f64 = 38.135_470_876_024_44;
const HIGHPASS_Q: f64 = 0.500_327_037_323_877_3;

/// Second-order IIR section in direct form II transposed (f64 state)
#[derive(Debug, Clone, PartialEq)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    s1: f64,
    s2: f64,
}

impl Biquad {
    /// Section with normalized coefficients (`a0 = 1`)
    pub fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self {
            b0: b[0],
            b1: b[1],
            b2: b[2],
            a1: a[0],
            a2: a[1],
            s1: 0.0,
            s2: 0.0,
        }
    }

    /// Pass-through section
    pub fn identity() -> Self {
        Self::new([1.0, 0.0, 0.0], [0.0, 0.0])
    }

    /// Numerator coefficients `[b0, b1, b2]`
    #[cfg(test)]
    fn numerator(&self) -> [f64; 3] {
        [self.b0, self.b1, self.b2]
    }

    /// Denominator coefficients `[a1, a2]` (`a0 = 1`)
    #[cfg(test)]
    fn denominator(&self) -> [f64; 2] {
        [self.a1, self.a2]
    }

    /// Filter one sample
    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.s1;
        self.s1 = self.b1 * x - self.a1 * y + self.s2;
        self.s2 = self.b2 * x - self.a2 * y;
        y
    }

    /// Clear the filter state
    #[cfg(test)]
    fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}

/// K-weighting filter for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct KWeightingFilter {
    shelf: Biquad,
    highpass: Biquad,
}

impl KWeightingFilter {
    /// Create a K-weighting filter for the given sample rate
    ///
    /// A stage whose corner frequency is at or above Nyquist cannot be realized
    /// and is replaced by a pass-through, so very low sample rates are measured
    /// with a degraded (but stable) weighting.
    pub fn new(sample_rate: u32) -> Self {
        let fs = sample_rate as f64;
        let nyquist = fs / 2.0;

        let shelf = if SHELF_FREQUENCY < nyquist {
            let k = (PI * SHELF_FREQUENCY / fs).tan();
            let vh = 10.0f64.powf(SHELF_GAIN_DB / 20.0);
            let vb = vh.powf(SHELF_BAND_EXPONENT);
            let a0 = 1.0 + k / SHELF_Q + k * k;
            Biquad::new(
                [
                    (vh + vb * k / SHELF_Q + k * k) / a0,
                    2.0 * (k * k - vh) / a0,
                    (vh - vb * k / SHELF_Q + k * k) / a0,
                ],
                [2.0 * (k * k - 1.0) / a0, (1.0 - k / SHELF_Q + k * k) / a0],
            )
        } else {
            log::warn!(
                "Sample rate {} Hz too low for the K-weighting shelf, skipping it",
                sample_rate
            );
            Biquad::identity()
        };

        let highpass = if HIGHPASS_FREQUENCY < nyquist {
            let k = (PI * HIGHPASS_FREQUENCY / fs).tan();
            let a0 = 1.0 + k / HIGHPASS_Q + k * k;
            Biquad::new(
                [1.0, -2.0, 1.0],
                [
                    2.0 * (k * k - 1.0) / a0,
                    (1.0 - k / HIGHPASS_Q + k * k) / a0,
                ],
            )
        } else {
            Biquad::identity()
        };

        Self { shelf, highpass }
    }

    /// Filter one sample
    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        self.highpass.process(self.shelf.process(x))
    }

    /// Filter a whole buffer from the current state
    pub fn process_buffer(&mut self, samples: &[f32]) -> Vec<f64> {
        samples.iter().map(|&s| self.process(s as f64)).collect()
    }

    /// Clear both stages
    #[cfg(test)]
    fn reset(&mut self) {
        self.shelf.reset();
        self.highpass.reset();
    }

    /// Shelf stage
    #[cfg(test)]
    fn shelf(&self) -> &Biquad {
        &self.shelf
    }

    /// High-pass stage
    #[cfg(test)]
    fn highpass(&self) -> &Biquad {
        &self.highpass
    }
}
