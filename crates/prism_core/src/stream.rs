//! Audio Stream Management
//!
//! Builds the CPAL capture/output stream pair and hosts the real-time
//! callback. The output callback is the hard-real-time producer of the
//! whole system:
//!
//! ```text
//! capture callback ──rtrb──▶ output callback
//!                             │ snapshot params (atomics)
//!                             │ FilterChain::apply_settings + process
//!                             └─▶ per-channel block FIFOs ──▶ analyzer
//! ```
//!
//! Nothing in either callback allocates, locks, or blocks. Parameter
//! changes arrive through the shared [`ParamTable`]; coefficient
//! recomputation happens inside the callback, between blocks.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig as CpalStreamConfig};
use crossbeam_channel::Sender;
use rtrb::{Consumer, Producer, RingBuffer};

use prism_dsp::{ChannelSampleFifo, FilterChain};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::message::Event;
use crate::params::ParamTable;

/// State shared between the audio callback and the control thread
pub struct SharedState {
    /// Whether the whole chain is bypassed (passthrough)
    pub bypassed: AtomicBool,

    /// Peak level left channel, f32 bits (for meters)
    peak_left_bits: AtomicU32,

    /// Peak level right channel
    peak_right_bits: AtomicU32,

    /// Set by the control side; the callback clears the delay lines
    /// at the start of its next block
    reset_requested: AtomicBool,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            bypassed: AtomicBool::new(false),
            peak_left_bits: AtomicU32::new(0.0_f32.to_bits()),
            peak_right_bits: AtomicU32::new(0.0_f32.to_bits()),
            reset_requested: AtomicBool::new(false),
        }
    }

    pub fn set_peaks(&self, left: f32, right: f32) {
        self.peak_left_bits.store(left.to_bits(), Ordering::Relaxed);
        self.peak_right_bits
            .store(right.to_bits(), Ordering::Relaxed);
    }

    pub fn peaks(&self) -> (f32, f32) {
        (
            f32::from_bits(self.peak_left_bits.load(Ordering::Relaxed)),
            f32::from_bits(self.peak_right_bits.load(Ordering::Relaxed)),
        )
    }

    /// Ask the callback to clear the filter delay lines
    pub fn request_reset(&self) {
        self.reset_requested.store(true, Ordering::Release);
    }

    fn take_reset(&self) -> bool {
        self.reset_requested.swap(false, Ordering::AcqRel)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Manages an active capture → EQ → output stream pair
pub struct AudioStream {
    /// Kept alive to maintain audio flow; dropping stops the callbacks
    #[allow(dead_code)]
    capture_stream: Stream,

    #[allow(dead_code)]
    output_stream: Stream,
}

impl AudioStream {
    /// Build and start the stream pair
    ///
    /// The analyzer feeds are moved into the output callback; their
    /// consumer halves belong to whoever renders the spectrum.
    pub fn new(
        config: &EngineConfig,
        capture_device: &Device,
        output_device: &Device,
        params: Arc<ParamTable>,
        shared: Arc<SharedState>,
        feeds: (ChannelSampleFifo, ChannelSampleFifo),
        event_sender: Sender<Event>,
    ) -> EngineResult<Self> {
        config.stream.validate().map_err(EngineError::ConfigError)?;

        // Ring between the capture and output callbacks
        let ring_size = config.ring_buffer_frames * config.stream.channels as usize;
        let (producer, consumer) = RingBuffer::<f32>::new(ring_size);

        let cpal_config = CpalStreamConfig {
            channels: config.stream.channels,
            sample_rate: cpal::SampleRate(config.stream.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.stream.buffer_size),
        };

        let capture_stream =
            Self::build_capture_stream(capture_device, &cpal_config, producer, &event_sender)?;

        let output_stream = Self::build_output_stream(
            output_device,
            &cpal_config,
            consumer,
            params,
            shared,
            feeds,
            config.stream.sample_rate as f32,
            event_sender,
        )?;

        capture_stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;
        output_stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;

        Ok(Self {
            capture_stream,
            output_stream,
        })
    }

    fn build_capture_stream(
        device: &Device,
        config: &CpalStreamConfig,
        mut producer: Producer<f32>,
        event_sender: &Sender<Event>,
    ) -> EngineResult<Stream> {
        let err_sender = event_sender.clone();
        let event_sender = event_sender.clone();

        let stream = device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Real-time callback - no allocation allowed here
                    let writable = producer.slots().min(data.len());
                    if writable < data.len() {
                        // The output side is not consuming fast enough;
                        // drop the tail rather than wait
                        let _ = event_sender.try_send(Event::BufferUnderrun);
                    }

                    if let Ok(mut chunk) = producer.write_chunk_uninit(writable) {
                        let (first, second) = chunk.as_mut_slices();
                        let split = first.len();
                        for (slot, &sample) in first.iter_mut().zip(&data[..split]) {
                            slot.write(sample);
                        }
                        for (slot, &sample) in second.iter_mut().zip(&data[split..writable]) {
                            slot.write(sample);
                        }
                        // Safety: exactly `writable` slots were initialized above
                        unsafe { chunk.commit_all() };
                    }
                },
                move |err| {
                    let _ = err_sender.try_send(Event::error(err));
                },
                None,
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

        Ok(stream)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_output_stream(
        device: &Device,
        config: &CpalStreamConfig,
        mut consumer: Consumer<f32>,
        params: Arc<ParamTable>,
        shared: Arc<SharedState>,
        feeds: (ChannelSampleFifo, ChannelSampleFifo),
        sample_rate: f32,
        event_sender: Sender<Event>,
    ) -> EngineResult<Stream> {
        let err_sender = event_sender.clone();

        let mut chain = FilterChain::new(sample_rate);
        chain.apply_settings(&params.snapshot());
        let (mut left_feed, mut right_feed) = feeds;

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // Real-time callback - no allocation allowed here

                    // Pull captured samples; fill the shortfall with silence
                    let available = consumer.slots();
                    let to_read = data.len().min(available);
                    if to_read < data.len() {
                        data.fill(0.0);
                        let _ = event_sender.try_send(Event::BufferUnderrun);
                    }

                    if let Ok(chunk) = consumer.read_chunk(to_read) {
                        let (first, second) = chunk.as_slices();
                        data[..first.len()].copy_from_slice(first);
                        if !second.is_empty() {
                            data[first.len()..first.len() + second.len()]
                                .copy_from_slice(second);
                        }
                        chunk.commit_all();
                    }

                    if shared.take_reset() {
                        chain.reset();
                    }

                    // Recompute coefficients when the snapshot changed;
                    // a no-op otherwise
                    chain.apply_settings(&params.snapshot());

                    if !shared.bypassed.load(Ordering::Relaxed) {
                        chain.process_interleaved(data);
                    }

                    // Hand the processed block to the analysis side and
                    // track peaks for the meters
                    let mut peak_l = 0.0_f32;
                    let mut peak_r = 0.0_f32;
                    for frame in data.chunks_exact(2) {
                        left_feed.push_sample(frame[0]);
                        right_feed.push_sample(frame[1]);
                        peak_l = peak_l.max(frame[0].abs());
                        peak_r = peak_r.max(frame[1].abs());
                    }
                    shared.set_peaks(peak_l, peak_r);
                },
                move |err| {
                    let _ = err_sender.try_send(Event::error(err));
                },
                None,
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

        Ok(stream)
    }
}
