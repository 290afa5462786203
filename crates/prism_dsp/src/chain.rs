//! Filter Chain
//!
//! A fixed-topology cascade of biquad sections per channel:
//! four low-cut sections, two peak sections, four high-cut sections,
//! always processed in that order. The topology never changes after
//! construction; per-section bypass flags decide which sections
//! participate in a given block.
//!
//! Coefficient updates swap whole coefficient sets between blocks and
//! are allocation-free. The processing path performs no allocation, no
//! locking, and no error handling - non-finite samples propagate
//! unchanged and are dealt with downstream.

use biquad::{Biquad, Coefficients, DirectForm2Transposed};

use crate::bands::ChainSettings;
use crate::coefficients::{self, Cascade, IDENTITY, MAX_CUT_SECTIONS};
use crate::error::DspError;

/// Section indices in processing order
pub const LOW_CUT_START: usize = 0;
pub const PEAK1_INDEX: usize = MAX_CUT_SECTIONS;
pub const PEAK2_INDEX: usize = MAX_CUT_SECTIONS + 1;
pub const HIGH_CUT_START: usize = MAX_CUT_SECTIONS + 2;

/// Total number of physical sections per channel
pub const NUM_SECTIONS: usize = 2 * MAX_CUT_SECTIONS + 2;

/// One biquad section with its own delay-line state and bypass flag
struct Section {
    // DirectForm2Transposed: better numerical stability than DF1
    filter: DirectForm2Transposed<f32>,
    bypassed: bool,
}

impl Section {
    fn identity() -> Self {
        Self {
            filter: DirectForm2Transposed::<f32>::new(IDENTITY),
            bypassed: true,
        }
    }

    #[inline]
    fn run(&mut self, sample: f32) -> f32 {
        if self.bypassed {
            sample
        } else {
            self.filter.run(sample)
        }
    }
}

/// The stereo EQ filter chain
///
/// Both channels share coefficients but keep independent delay state.
/// Designed for real-time use: no allocations in `process_*`.
pub struct FilterChain {
    left: [Section; NUM_SECTIONS],
    right: [Section; NUM_SECTIONS],
    settings: ChainSettings,
    sample_rate: f32,
}

impl FilterChain {
    /// Create a chain for a fixed sample rate with default (neutral) settings
    pub fn new(sample_rate: f32) -> Self {
        let mut chain = Self {
            left: std::array::from_fn(|_| Section::identity()),
            right: std::array::from_fn(|_| Section::identity()),
            settings: ChainSettings::default(),
            sample_rate,
        };
        let settings = chain.settings;
        chain.rebuild(&settings);
        chain
    }

    /// Apply a settings snapshot, recomputing coefficients where needed
    ///
    /// Cheap when the snapshot is unchanged; safe to call every block.
    /// Updates take effect from the next `process_*` call.
    pub fn apply_settings(&mut self, settings: &ChainSettings) {
        if *settings == self.settings {
            return;
        }
        self.rebuild(settings);
        self.settings = *settings;
    }

    fn rebuild(&mut self, settings: &ChainSettings) {
        let low = coefficients::low_cut(&settings.low_cut, self.sample_rate);
        let high = coefficients::high_cut(&settings.high_cut, self.sample_rate);
        let peak1 = coefficients::peak(&settings.peak1, self.sample_rate);
        let peak2 = coefficients::peak(&settings.peak2, self.sample_rate);

        self.apply_cascade(LOW_CUT_START, &low, settings.low_cut.bypassed);
        self.apply_cascade(HIGH_CUT_START, &high, settings.high_cut.bypassed);

        for channel in [&mut self.left, &mut self.right] {
            channel[PEAK1_INDEX].filter.update_coefficients(peak1);
            channel[PEAK1_INDEX].bypassed = settings.peak1.bypassed;
            channel[PEAK2_INDEX].filter.update_coefficients(peak2);
            channel[PEAK2_INDEX].bypassed = settings.peak2.bypassed;
        }
    }

    /// Install a cut cascade starting at `start`, bypassing the unused
    /// high-order slots so the response matches the requested order
    fn apply_cascade(&mut self, start: usize, cascade: &Cascade, band_bypassed: bool) {
        for slot in 0..MAX_CUT_SECTIONS {
            let bypassed = band_bypassed || slot >= cascade.active;
            for channel in [&mut self.left, &mut self.right] {
                let section = &mut channel[start + slot];
                section.filter.update_coefficients(cascade.sections[slot]);
                section.bypassed = bypassed;
            }
        }
    }

    /// Replace the coefficients of a single section on both channels
    ///
    /// Takes effect from the next block; the section's delay state is
    /// preserved across the swap.
    pub fn update_section(
        &mut self,
        index: usize,
        coeffs: Coefficients<f32>,
    ) -> Result<(), DspError> {
        if index >= NUM_SECTIONS {
            return Err(DspError::InvalidSection(index));
        }
        self.left[index].filter.update_coefficients(coeffs);
        self.right[index].filter.update_coefficients(coeffs);
        Ok(())
    }

    /// Toggle whether a section participates in processing
    ///
    /// A bypassed section is a perfect identity: its samples are not
    /// touched at all.
    pub fn set_section_bypassed(&mut self, index: usize, bypassed: bool) -> Result<(), DspError> {
        if index >= NUM_SECTIONS {
            return Err(DspError::InvalidSection(index));
        }
        self.left[index].bypassed = bypassed;
        self.right[index].bypassed = bypassed;
        Ok(())
    }

    pub fn is_section_bypassed(&self, index: usize) -> Result<bool, DspError> {
        if index >= NUM_SECTIONS {
            return Err(DspError::InvalidSection(index));
        }
        Ok(self.left[index].bypassed)
    }

    /// Process a stereo sample pair through all active sections
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls, bounded time.
    #[inline]
    pub fn process_sample(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mut l = left;
        let mut r = right;
        for i in 0..NUM_SECTIONS {
            l = self.left[i].run(l);
            r = self.right[i].run(r);
        }
        (l, r)
    }

    /// Process an interleaved stereo buffer in-place
    ///
    /// Buffer format: [L0, R0, L1, R1, ...]. Block length may vary call
    /// to call; a trailing odd sample is left untouched.
    #[inline]
    pub fn process_interleaved(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_exact_mut(2) {
            let (l, r) = self.process_sample(frame[0], frame[1]);
            frame[0] = l;
            frame[1] = r;
        }
    }

    /// Process separate left/right channel buffers in-place
    #[inline]
    pub fn process_planar(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len(), "Channel buffers must be same length");

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (new_l, new_r) = self.process_sample(*l, *r);
            *l = new_l;
            *r = new_r;
        }
    }

    /// Current settings snapshot
    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Clear all delay lines
    ///
    /// Call when the input source changes to prevent filter ringing.
    pub fn reset(&mut self) {
        for i in 0..NUM_SECTIONS {
            self.left[i].filter.reset_state();
            self.right[i].filter.reset_state();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::Slope;

    fn all_bypassed() -> ChainSettings {
        let mut settings = ChainSettings::default();
        settings.low_cut.bypassed = true;
        settings.peak1.bypassed = true;
        settings.peak2.bypassed = true;
        settings.high_cut.bypassed = true;
        settings
    }

    #[test]
    fn test_bypassed_chain_is_bit_identical() {
        let mut settings = all_bypassed();
        // Non-neutral parameters must not matter while bypassed
        settings.peak1.gain_db = 12.0;
        settings.low_cut.frequency = 500.0;
        settings.low_cut.slope = Slope::Db48;

        let mut chain = FilterChain::new(48_000.0);
        chain.apply_settings(&settings);

        let input = [0.5_f32, -0.5, 0.123_456_7, -1.0, 0.0, 1.0];
        let mut left = input;
        let mut right = input;
        chain.process_planar(&mut left, &mut right);

        assert_eq!(left, input);
        assert_eq!(right, input);
    }

    #[test]
    fn test_slope_controls_active_section_count() {
        let mut chain = FilterChain::new(48_000.0);

        for slope in Slope::ALL {
            let mut settings = ChainSettings::default();
            settings.low_cut.slope = slope;
            settings.low_cut.frequency = 200.0;
            settings.high_cut.slope = slope;
            settings.high_cut.frequency = 8_000.0;
            chain.apply_settings(&settings);

            let low_active = (0..MAX_CUT_SECTIONS)
                .filter(|&i| !chain.is_section_bypassed(LOW_CUT_START + i).unwrap())
                .count();
            let high_active = (0..MAX_CUT_SECTIONS)
                .filter(|&i| !chain.is_section_bypassed(HIGH_CUT_START + i).unwrap())
                .count();

            assert_eq!(low_active, slope.sections());
            assert_eq!(high_active, slope.sections());
        }
    }

    #[test]
    fn test_cut_bypass_is_independent() {
        // Each cut filter follows its own bypass setting only
        let mut settings = ChainSettings::default();
        settings.low_cut.bypassed = true;
        settings.high_cut.bypassed = false;

        let mut chain = FilterChain::new(48_000.0);
        chain.apply_settings(&settings);

        assert!(chain.is_section_bypassed(LOW_CUT_START).unwrap());
        assert!(!chain.is_section_bypassed(HIGH_CUT_START).unwrap());
    }

    #[test]
    fn test_invalid_section_index() {
        let mut chain = FilterChain::new(48_000.0);
        assert!(chain.set_section_bypassed(NUM_SECTIONS, true).is_err());
        assert!(chain.update_section(99, IDENTITY).is_err());
        assert!(chain.is_section_bypassed(NUM_SECTIONS).is_err());
    }

    #[test]
    fn test_non_finite_samples_propagate() {
        let mut settings = ChainSettings::default();
        settings.peak1.gain_db = 6.0;

        let mut chain = FilterChain::new(48_000.0);
        chain.apply_settings(&settings);

        let (l, _) = chain.process_sample(f32::NAN, 0.0);
        assert!(l.is_nan());
    }

    #[test]
    fn test_interleaved_matches_planar() {
        let mut settings = ChainSettings::default();
        settings.peak1.gain_db = 6.0;
        settings.low_cut.frequency = 100.0;

        let mut a = FilterChain::new(48_000.0);
        let mut b = FilterChain::new(48_000.0);
        a.apply_settings(&settings);
        b.apply_settings(&settings);

        let frames = 64;
        let mut interleaved: Vec<f32> = (0..frames * 2).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut left: Vec<f32> = interleaved.iter().step_by(2).copied().collect();
        let mut right: Vec<f32> = interleaved.iter().skip(1).step_by(2).copied().collect();

        a.process_interleaved(&mut interleaved);
        b.process_planar(&mut left, &mut right);

        for i in 0..frames {
            assert_eq!(interleaved[i * 2], left[i]);
            assert_eq!(interleaved[i * 2 + 1], right[i]);
        }
    }

    #[test]
    fn test_boost_increases_amplitude() {
        let mut settings = ChainSettings::default();
        settings.peak1.frequency = 1_000.0;
        settings.peak1.gain_db = 12.0;
        settings.peak1.q = 1.0;

        let mut chain = FilterChain::new(48_000.0);
        chain.apply_settings(&settings);

        let sample_rate = 48_000.0;
        let mut max_input = 0.0_f32;
        let mut max_output = 0.0_f32;

        for i in 0..4_000 {
            let t = i as f32 / sample_rate;
            let sample = (2.0 * std::f32::consts::PI * 1_000.0 * t).sin() * 0.5;
            max_input = max_input.max(sample.abs());

            let (out, _) = chain.process_sample(sample, sample);
            max_output = max_output.max(out.abs());
        }

        assert!(max_output > max_input, "Boost should increase amplitude");
    }

    #[test]
    fn test_apply_settings_is_idempotent_for_state() {
        let mut chain = FilterChain::new(48_000.0);
        let settings = *chain.settings();

        // Run some audio, reapply identical settings, keep running:
        // delay state must not be disturbed by a no-op update
        let (a1, _) = chain.process_sample(0.5, 0.5);
        chain.apply_settings(&settings);
        let (a2, _) = chain.process_sample(0.5, 0.5);

        let mut reference = FilterChain::new(48_000.0);
        let (b1, _) = reference.process_sample(0.5, 0.5);
        let (b2, _) = reference.process_sample(0.5, 0.5);

        assert_eq!(a1, b1);
        assert_eq!(a2, b2);
    }

    #[test]
    fn test_reset_clears_ringing() {
        let mut settings = ChainSettings::default();
        settings.low_cut.frequency = 1_000.0;
        settings.low_cut.slope = Slope::Db48;

        let mut chain = FilterChain::new(48_000.0);
        chain.apply_settings(&settings);

        for _ in 0..500 {
            chain.process_sample(1.0, 1.0);
        }
        chain.reset();

        // After reset a fresh chain and this one agree exactly
        let mut fresh = FilterChain::new(48_000.0);
        fresh.apply_settings(&settings);

        let (a, _) = chain.process_sample(0.25, 0.25);
        let (b, _) = fresh.process_sample(0.25, 0.25);
        assert_eq!(a, b);
    }
}
