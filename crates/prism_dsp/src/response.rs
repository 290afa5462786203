//! Analytic Response Curve
//!
//! Computes the chain's theoretical magnitude response directly from
//! coefficient values - a closed-form evaluation of each section's
//! transfer function on the unit circle, not a simulation. The curve is
//! rebuilt from a settings snapshot, never from the audio thread's live
//! filter state, so there is nothing to race with.

use biquad::Coefficients;
use rustfft::num_complex::Complex;

use crate::bands::ChainSettings;
use crate::coefficients::{self, Cascade};
use crate::path::{position_frequency, CurveBounds, Point, SpectrumPath};

/// Magnitude of one biquad's transfer function at `frequency`
///
/// Evaluates H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)
/// at z = e^(jw), w = 2 pi frequency / sample rate.
pub fn section_magnitude(coeffs: &Coefficients<f32>, frequency: f32, sample_rate: f32) -> f32 {
    let w = 2.0 * std::f32::consts::PI * frequency / sample_rate;
    let z1 = Complex::new(w.cos(), -w.sin());
    let z2 = z1 * z1;

    let numerator = Complex::new(coeffs.b0, 0.0) + z1 * coeffs.b1 + z2 * coeffs.b2;
    let denominator = Complex::new(1.0, 0.0) + z1 * coeffs.a1 + z2 * coeffs.a2;

    (numerator / denominator).norm()
}

/// The chain's total magnitude response, recomputed from settings
pub struct ResponseCurve {
    low_cut: Cascade,
    peak1: Coefficients<f32>,
    peak2: Coefficients<f32>,
    high_cut: Cascade,
    low_cut_bypassed: bool,
    peak1_bypassed: bool,
    peak2_bypassed: bool,
    high_cut_bypassed: bool,
    sample_rate: f32,
}

impl ResponseCurve {
    /// Build the curve's own coefficient set from a settings snapshot
    pub fn new(settings: &ChainSettings, sample_rate: f32) -> Self {
        Self {
            low_cut: coefficients::low_cut(&settings.low_cut, sample_rate),
            peak1: coefficients::peak(&settings.peak1, sample_rate),
            peak2: coefficients::peak(&settings.peak2, sample_rate),
            high_cut: coefficients::high_cut(&settings.high_cut, sample_rate),
            low_cut_bypassed: settings.low_cut.bypassed,
            peak1_bypassed: settings.peak1.bypassed,
            peak2_bypassed: settings.peak2.bypassed,
            high_cut_bypassed: settings.high_cut.bypassed,
            sample_rate,
        }
    }

    /// Total response in dB at one frequency
    ///
    /// Per-section magnitudes are combined in the log domain; bypassed
    /// bands contribute exactly nothing.
    pub fn magnitude_db(&self, frequency: f32) -> f32 {
        let mut db = 0.0;

        if !self.low_cut_bypassed {
            for coeffs in &self.low_cut.sections[..self.low_cut.active] {
                db += to_db(section_magnitude(coeffs, frequency, self.sample_rate));
            }
        }
        if !self.peak1_bypassed {
            db += to_db(section_magnitude(&self.peak1, frequency, self.sample_rate));
        }
        if !self.peak2_bypassed {
            db += to_db(section_magnitude(&self.peak2, frequency, self.sample_rate));
        }
        if !self.high_cut_bypassed {
            for coeffs in &self.high_cut.sections[..self.high_cut.active] {
                db += to_db(section_magnitude(coeffs, frequency, self.sample_rate));
            }
        }

        db
    }

    /// Sample the response across `bounds`, one vertex per pixel column
    ///
    /// Frequencies are log-spaced over 20Hz-20kHz; dB values are clamped
    /// into `[min_db, max_db]` and mapped linearly onto the vertical
    /// range.
    pub fn curve(&self, bounds: CurveBounds, min_db: f32, max_db: f32) -> SpectrumPath {
        let columns = (bounds.width.max(1.0)) as usize;
        let mut points = Vec::with_capacity(columns + 1);

        for column in 0..=columns {
            let position = column as f32 / columns as f32;
            let frequency = position_frequency(position);
            let db = self.magnitude_db(frequency).clamp(min_db, max_db);

            let t = (db - min_db) / (max_db - min_db);
            points.push(Point {
                x: bounds.left + position * bounds.width,
                y: bounds.bottom() + (bounds.top - bounds.bottom()) * t,
            });
        }

        SpectrumPath { points }
    }
}

fn to_db(magnitude: f32) -> f32 {
    // Floor far below the display range so a cut filter's stopband
    // cannot produce -inf
    20.0 * magnitude.max(1e-12).log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::Slope;

    #[test]
    fn test_peak_gain_at_center_frequency() {
        let mut settings = ChainSettings::default();
        settings.peak1.frequency = 1_000.0;
        settings.peak1.gain_db = 6.0;
        settings.peak1.q = 1.0;
        // Isolate the peak band; the cut corners sit inside the probe range
        settings.low_cut.bypassed = true;
        settings.high_cut.bypassed = true;

        let response = ResponseCurve::new(&settings, 44_100.0);

        // Exactly the configured boost at the center...
        assert!((response.magnitude_db(1_000.0) - 6.0).abs() < 0.05);
        // ...and flat at the extremes
        assert!(response.magnitude_db(20.0).abs() < 0.1);
        assert!(response.magnitude_db(21_000.0).abs() < 0.1);
    }

    #[test]
    fn test_neutral_settings_are_flat() {
        let response = ResponseCurve::new(&ChainSettings::default(), 48_000.0);

        // Default cut corners sit at the edges of the audible range, so
        // the mid band must be flat to within a fraction of a dB
        for freq in [100.0, 500.0, 1_000.0, 5_000.0] {
            assert!(
                response.magnitude_db(freq).abs() < 0.5,
                "Expected flat response at {}Hz",
                freq
            );
        }
    }

    #[test]
    fn test_bypassed_bands_contribute_nothing() {
        let mut settings = ChainSettings::default();
        settings.peak1.gain_db = 12.0;
        settings.peak1.bypassed = true;
        settings.low_cut.frequency = 1_000.0;
        settings.low_cut.slope = Slope::Db48;
        settings.low_cut.bypassed = true;
        settings.high_cut.bypassed = true;
        settings.peak2.bypassed = true;

        let response = ResponseCurve::new(&settings, 48_000.0);
        for freq in [20.0, 100.0, 1_000.0, 10_000.0, 20_000.0] {
            assert_eq!(response.magnitude_db(freq), 0.0);
        }
    }

    #[test]
    fn test_butterworth_corner_is_minus_three_db() {
        // Any-order Butterworth is -3.01dB at its corner frequency
        for slope in Slope::ALL {
            let mut settings = ChainSettings::default();
            settings.low_cut.frequency = 1_000.0;
            settings.low_cut.slope = slope;

            let response = ResponseCurve::new(&settings, 48_000.0);
            let db = response.magnitude_db(1_000.0);
            assert!(
                (db + 3.01).abs() < 0.1,
                "{:?} corner response was {}dB",
                slope,
                db
            );
        }
    }

    #[test]
    fn test_slope_steepens_with_order() {
        // One octave into the stopband, each slope step adds ~12dB
        let mut previous = 0.0;
        for slope in Slope::ALL {
            let mut settings = ChainSettings::default();
            settings.low_cut.frequency = 1_000.0;
            settings.low_cut.slope = slope;

            let response = ResponseCurve::new(&settings, 48_000.0);
            let attenuation = -response.magnitude_db(500.0);
            assert!(
                attenuation > previous + 8.0,
                "{:?} should attenuate much more than the previous slope",
                slope
            );
            previous = attenuation;
        }
        // 48dB/oct: an octave down is attenuated by roughly its slope
        assert!(previous > 40.0);
    }

    #[test]
    fn test_negative_gain_cuts() {
        let mut settings = ChainSettings::default();
        settings.peak2.frequency = 2_000.0;
        settings.peak2.gain_db = -9.0;
        settings.peak2.q = 2.0;

        let response = ResponseCurve::new(&settings, 48_000.0);
        assert!((response.magnitude_db(2_000.0) + 9.0).abs() < 0.05);
    }

    #[test]
    fn test_curve_spans_bounds() {
        let mut settings = ChainSettings::default();
        settings.peak1.gain_db = 6.0;

        let response = ResponseCurve::new(&settings, 48_000.0);
        let bounds = CurveBounds::new(0.0, 0.0, 400.0, 200.0);
        let path = response.curve(bounds, -24.0, 24.0);

        assert_eq!(path.points.len(), 401);
        assert_eq!(path.points[0].x, 0.0);
        assert!((path.points.last().unwrap().x - 400.0).abs() < 1e-3);
        for p in &path.points {
            assert!(p.y >= bounds.top && p.y <= bounds.bottom());
        }
    }

    #[test]
    fn test_curve_matches_point_queries() {
        let mut settings = ChainSettings::default();
        settings.peak1.frequency = 1_000.0;
        settings.peak1.gain_db = 6.0;

        let response = ResponseCurve::new(&settings, 48_000.0);
        let bounds = CurveBounds::new(0.0, 0.0, 100.0, 100.0);
        let path = response.curve(bounds, -24.0, 24.0);

        // Mid-height corresponds to 0dB; the boosted region must rise
        // above it (smaller y)
        let mid_y = bounds.top + bounds.height / 2.0;
        let min_y = path
            .points
            .iter()
            .map(|p| p.y)
            .fold(f32::INFINITY, f32::min);
        assert!(min_y < mid_y);
    }
}
