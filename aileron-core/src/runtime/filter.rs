//! Second order low-pass filter

use core::f32::consts::{FRAC_1_SQRT_2, PI};

/// Biquad low-pass, direct form 2 transposed
///
/// The first sample primes the delay line to its steady state so the
/// output starts at the input instead of ramping up from zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadFilter {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
    primed: bool,
}

impl BiquadFilter {
    /// Butterworth low-pass
    ///
    /// Returns `None` when the cutoff is zero or not below Nyquist.
    pub fn lowpass(cutoff_hz: f32, sample_rate_hz: f32) -> Option<Self> {
        if cutoff_hz <= 0.0 || sample_rate_hz <= 0.0 || cutoff_hz >= sample_rate_hz / 2.0 {
            return None;
        }

        let omega = 2.0 * PI * cutoff_hz / sample_rate_hz;
        let sn = libm::sinf(omega);
        let cs = libm::cosf(omega);
        let alpha = sn / (2.0 * FRAC_1_SQRT_2);

        let a0 = 1.0 + alpha;
        let b1 = (1.0 - cs) / a0;
        Some(Self {
            b0: b1 / 2.0,
            b1,
            b2: b1 / 2.0,
            a1: -2.0 * cs / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
            primed: false,
        })
    }

    /// Low-pass for a loop period given in microseconds
    pub fn for_looptime(cutoff_hz: u8, looptime_us: u16) -> Option<Self> {
        if looptime_us == 0 {
            return None;
        }
        Self::lowpass(cutoff_hz as f32, 1_000_000.0 / looptime_us as f32)
    }

    pub fn apply(&mut self, input: f32) -> f32 {
        if !self.primed {
            self.z1 = input * (1.0 - self.b0);
            self.z2 = input * (self.b2 - self.a2);
            self.primed = true;
        }

        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    /// Forget the delay line, keeping the coefficients
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
        self.primed = false;
    }
}
