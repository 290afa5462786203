//! Coefficient Factory
//!
//! Pure functions from band settings + sample rate to biquad coefficient
//! sets, based on the RBJ (Robert Bristow-Johnson) Audio EQ Cookbook for
//! the peak bands and a Butterworth pole decomposition for the cut bands.
//!
//! Every function here is total: out-of-range inputs are clamped to the
//! nearest valid value, non-finite inputs fall back to neutral values,
//! and no allocation happens. Safe to call from the audio callback.

use std::f32::consts::PI;

use biquad::{Coefficients, ToHertz, Type};

use crate::bands::{CutBand, PeakBand, MAX_FREQUENCY, MAX_GAIN_DB, MAX_Q, MIN_FREQUENCY, MIN_Q};

/// Maximum number of cascaded second-order sections per cut band
pub const MAX_CUT_SECTIONS: usize = 4;

/// Coefficients of a unity-gain, zero-phase pass-through section
pub const IDENTITY: Coefficients<f32> = Coefficients {
    a1: 0.0,
    a2: 0.0,
    b0: 1.0,
    b1: 0.0,
    b2: 0.0,
};

/// Coefficient sets for a cut band cascade
///
/// Slots beyond `active` hold [`IDENTITY`] and correspond to bypassed
/// chain sections, so the cascade realizes exactly the requested order.
#[derive(Debug, Clone, Copy)]
pub struct Cascade {
    pub sections: [Coefficients<f32>; MAX_CUT_SECTIONS],
    pub active: usize,
}

/// Clamp a band frequency into the representable range for this session
fn clamp_frequency(frequency: f32, sample_rate: f32) -> f32 {
    let freq = if frequency.is_finite() {
        frequency
    } else {
        MIN_FREQUENCY
    };
    // Keep strictly below Nyquist; the biquad designs are undefined at it
    let ceiling = (sample_rate * 0.5 * 0.999).min(MAX_FREQUENCY);
    freq.clamp(MIN_FREQUENCY, ceiling.max(MIN_FREQUENCY))
}

fn clamp_q(q: f32) -> f32 {
    if q.is_finite() {
        q.clamp(MIN_Q, MAX_Q)
    } else {
        biquad::Q_BUTTERWORTH_F32
    }
}

fn clamp_gain_db(gain_db: f32) -> f32 {
    if gain_db.is_finite() {
        gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB)
    } else {
        // Non-finite gain means unity, never an error
        0.0
    }
}

/// Peaking EQ coefficients for a peak band
pub fn peak(band: &PeakBand, sample_rate: f32) -> Coefficients<f32> {
    let freq = clamp_frequency(band.frequency, sample_rate);
    let q = clamp_q(band.q);
    let gain_db = clamp_gain_db(band.gain_db);

    Coefficients::<f32>::from_params(Type::PeakingEQ(gain_db), sample_rate.hz(), freq.hz(), q)
        .unwrap_or(IDENTITY)
}

/// Low-cut (highpass) Butterworth cascade for a cut band
pub fn low_cut(band: &CutBand, sample_rate: f32) -> Cascade {
    butterworth_cascade(Type::HighPass, band, sample_rate)
}

/// High-cut (lowpass) Butterworth cascade for a cut band
pub fn high_cut(band: &CutBand, sample_rate: f32) -> Cascade {
    butterworth_cascade(Type::LowPass, band, sample_rate)
}

fn butterworth_cascade(filter: Type<f32>, band: &CutBand, sample_rate: f32) -> Cascade {
    let freq = clamp_frequency(band.frequency, sample_rate);
    let active = band.slope.sections();
    let order = band.slope.order();

    let mut sections = [IDENTITY; MAX_CUT_SECTIONS];
    for (stage, coeffs) in sections.iter_mut().enumerate().take(active) {
        let q = butterworth_stage_q(order, stage);
        *coeffs = Coefficients::<f32>::from_params(filter, sample_rate.hz(), freq.hz(), q)
            .unwrap_or(IDENTITY);
    }

    Cascade { sections, active }
}

/// Per-stage Q of an order-N Butterworth polynomial decomposition
///
/// Pole pairs sit at angles theta_k = pi * (2k + 1) / (2N) on the unit
/// circle; each second-order section realizes one conjugate pair with
/// Q_k = 1 / (2 cos theta_k). Stages are ordered lowest Q first.
fn butterworth_stage_q(order: usize, stage: usize) -> f32 {
    let n = order as f32;
    let theta = PI * (2.0 * stage as f32 + 1.0) / (2.0 * n);
    1.0 / (2.0 * theta.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::Slope;

    #[test]
    fn test_butterworth_stage_qs() {
        // Order 2: the single stage is the classic 0.7071
        assert!((butterworth_stage_q(2, 0) - 0.7071).abs() < 1e-3);

        // Order 4: standard table values
        assert!((butterworth_stage_q(4, 0) - 0.5412).abs() < 1e-3);
        assert!((butterworth_stage_q(4, 1) - 1.3066).abs() < 1e-3);

        // Order 8: the last stage carries the highest Q
        assert!((butterworth_stage_q(8, 3) - 2.5629).abs() < 1e-3);
    }

    #[test]
    fn test_cascade_active_count_matches_slope() {
        for slope in Slope::ALL {
            let band = CutBand {
                slope,
                ..CutBand::new(1_000.0)
            };
            let cascade = low_cut(&band, 48_000.0);
            assert_eq!(cascade.active, slope.sections());
        }
    }

    #[test]
    fn test_cascade_inactive_sections_are_identity() {
        let band = CutBand::new(1_000.0); // Db12 -> one active section
        let cascade = high_cut(&band, 48_000.0);

        assert_eq!(cascade.active, 1);
        for coeffs in &cascade.sections[1..] {
            assert_eq!(coeffs.b0, 1.0);
            assert_eq!(coeffs.b1, 0.0);
            assert_eq!(coeffs.b2, 0.0);
            assert_eq!(coeffs.a1, 0.0);
            assert_eq!(coeffs.a2, 0.0);
        }
    }

    #[test]
    fn test_frequency_clamped_below_nyquist() {
        let mut band = PeakBand::new(30_000.0); // above Nyquist at 44.1k
        band.gain_db = 6.0;
        let coeffs = peak(&band, 44_100.0);

        for v in [coeffs.b0, coeffs.b1, coeffs.b2, coeffs.a1, coeffs.a2] {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_non_finite_inputs_fall_back() {
        let band = PeakBand {
            frequency: f32::NAN,
            gain_db: f32::INFINITY,
            q: f32::NAN,
            bypassed: false,
        };
        let coeffs = peak(&band, 48_000.0);

        for v in [coeffs.b0, coeffs.b1, coeffs.b2, coeffs.a1, coeffs.a2] {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_q_clamped_to_range() {
        assert_eq!(clamp_q(0.0), MIN_Q);
        assert_eq!(clamp_q(100.0), MAX_Q);
        assert_eq!(clamp_q(1.0), 1.0);
    }

    #[test]
    fn test_identity_is_exact_passthrough() {
        use biquad::{Biquad, DirectForm2Transposed};

        let mut filter = DirectForm2Transposed::<f32>::new(IDENTITY);
        for input in [0.0, 1.0, -0.5, 0.331, f32::MIN_POSITIVE] {
            assert_eq!(filter.run(input), input);
        }
    }

    #[test]
    fn test_determinism() {
        let band = PeakBand {
            frequency: 1_000.0,
            gain_db: 6.0,
            q: 1.0,
            bypassed: false,
        };
        let a = peak(&band, 44_100.0);
        let b = peak(&band, 44_100.0);
        assert_eq!(a.b0, b.b0);
        assert_eq!(a.a1, b.a1);
        assert_eq!(a.a2, b.a2);
    }
}
