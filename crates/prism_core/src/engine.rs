//! Audio Engine - Main Entry Point
//!
//! The `AudioEngine` lives on the control thread and manages the audio
//! processing thread over channels. Lifecycle commands travel through a
//! bounded crossbeam channel; band parameters bypass the queue entirely
//! and live in the shared atomic [`ParamTable`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Control / UI thread                   │
//! │  AudioEngine ──commands──▶          ◀──events──          │
//! │  ParamTable writes (atomic)   SpectrumOutlet::render()   │
//! └──────────────────────────────────────────────────────────┘
//!                 │ crossbeam-channel        ▲ block FIFOs
//!                 ▼                          │
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Audio thread                        │
//! │  Capture ──rtrb──▶ FilterChain ──▶ Output                │
//! │                        └──────────▶ per-channel FIFOs    │
//! │             (zero allocation in this path)               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! When a session starts, the audio thread builds fresh FIFOs sized for
//! the session's sample rate and block size and hands their consumer
//! halves back as a [`SpectrumOutlet`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{debug, error, info};

use prism_dsp::ChannelSampleFifo;

use crate::config::EngineConfig;
use crate::device;
use crate::error::{EngineError, EngineResult};
use crate::message::{Command, Event};
use crate::outlet::SpectrumOutlet;
use crate::params::{ParamId, ParamTable};
use crate::settings::EqSettings;
use crate::stream::{AudioStream, SharedState};

/// The main audio engine controller
pub struct AudioEngine {
    command_sender: Sender<Command>,
    event_receiver: Receiver<Event>,

    /// Delivers the analysis consumer bundle when a session starts
    outlet_receiver: Receiver<SpectrumOutlet>,

    audio_thread: Option<JoinHandle<()>>,
    shutdown_flag: Arc<AtomicBool>,
    is_running: Arc<AtomicBool>,

    params: Arc<ParamTable>,
    shared: Arc<SharedState>,
    config: EngineConfig,
}

impl AudioEngine {
    /// Create a new audio engine with default configuration
    pub fn new() -> EngineResult<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Create a new audio engine with custom configuration
    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        config.stream.validate().map_err(EngineError::ConfigError)?;

        let (command_sender, command_receiver) = bounded::<Command>(32);
        let (event_sender, event_receiver) = unbounded::<Event>();
        let (outlet_sender, outlet_receiver) = unbounded::<SpectrumOutlet>();

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let is_running = Arc::new(AtomicBool::new(false));
        let params = Arc::new(ParamTable::new());
        let shared = Arc::new(SharedState::new());

        let thread_shutdown = Arc::clone(&shutdown_flag);
        let thread_running = Arc::clone(&is_running);
        let thread_params = Arc::clone(&params);
        let thread_shared = Arc::clone(&shared);
        let thread_config = config.clone();

        let audio_thread = thread::Builder::new()
            .name("prism-audio".into())
            .spawn(move || {
                Self::audio_thread_main(
                    command_receiver,
                    event_sender,
                    outlet_sender,
                    thread_params,
                    thread_shared,
                    thread_shutdown,
                    thread_running,
                    thread_config,
                );
            })
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

        Ok(Self {
            command_sender,
            event_receiver,
            outlet_receiver,
            audio_thread: Some(audio_thread),
            shutdown_flag,
            is_running,
            params,
            shared,
            config,
        })
    }

    /// Start audio processing
    pub fn start(&self) -> EngineResult<()> {
        self.send_command(Command::Start)
    }

    /// Stop audio processing; parameters keep their values
    pub fn stop(&self) -> EngineResult<()> {
        self.send_command(Command::Stop)
    }

    /// Clear the filter delay lines (e.g. when the source changes)
    pub fn reset_chain(&self) -> EngineResult<()> {
        self.send_command(Command::ResetChain)
    }

    /// Request a state snapshot event
    pub fn request_state(&self) -> EngineResult<()> {
        self.send_command(Command::RequestState)
    }

    /// Set one EQ parameter; the audio thread picks it up next block
    pub fn set_parameter(&self, id: ParamId, value: f32) {
        self.params.set(id, value);
    }

    /// Read one EQ parameter
    pub fn parameter(&self, id: ParamId) -> f32 {
        self.params.get(id)
    }

    /// Apply a whole persisted settings tree
    pub fn apply_settings(&self, settings: &EqSettings) {
        settings.apply_to(&self.params);
    }

    /// Capture the current parameter values for persistence
    pub fn current_settings(&self) -> EqSettings {
        EqSettings::from_params(&self.params)
    }

    /// Bypass all processing (passthrough)
    pub fn set_bypass(&self, bypassed: bool) {
        self.shared.bypassed.store(bypassed, Ordering::Relaxed);
    }

    /// Current peak levels (left, right) for meters
    pub fn peaks(&self) -> (f32, f32) {
        self.shared.peaks()
    }

    /// Check if engine is currently running
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Get next event (non-blocking)
    pub fn poll_event(&self) -> Option<Event> {
        self.event_receiver.try_recv().ok()
    }

    /// Get next event (blocking)
    pub fn wait_event(&self) -> Option<Event> {
        self.event_receiver.recv().ok()
    }

    /// Take the analysis bundle for the session started by `start()`
    ///
    /// Returns None if no session came up within the timeout. Bundles
    /// from earlier sessions that were never claimed are discarded.
    pub fn spectrum_outlet(&self) -> Option<SpectrumOutlet> {
        let mut outlet = self
            .outlet_receiver
            .recv_timeout(Duration::from_millis(500))
            .ok()?;
        while let Ok(newer) = self.outlet_receiver.try_recv() {
            outlet = newer;
        }
        Some(outlet)
    }

    /// The shared parameter table (e.g. for a UI layer)
    pub fn params(&self) -> Arc<ParamTable> {
        Arc::clone(&self.params)
    }

    /// Get current configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn send_command(&self, command: Command) -> EngineResult<()> {
        self.command_sender
            .send(command)
            .map_err(|_| EngineError::ChannelSendError)
    }

    /// Audio thread main loop
    #[allow(clippy::too_many_arguments)]
    fn audio_thread_main(
        command_receiver: Receiver<Command>,
        event_sender: Sender<Event>,
        outlet_sender: Sender<SpectrumOutlet>,
        params: Arc<ParamTable>,
        shared: Arc<SharedState>,
        shutdown_flag: Arc<AtomicBool>,
        is_running: Arc<AtomicBool>,
        config: EngineConfig,
    ) {
        info!("Audio thread started");

        let mut stream: Option<AudioStream> = None;

        while !shutdown_flag.load(Ordering::SeqCst) {
            match command_receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(Command::Start) => {
                    if stream.is_some() {
                        debug!("Start ignored: already running");
                        continue;
                    }

                    match Self::start_session(
                        &config,
                        &params,
                        &shared,
                        &event_sender,
                        &outlet_sender,
                    ) {
                        Ok(new_stream) => {
                            stream = Some(new_stream);
                            is_running.store(true, Ordering::SeqCst);
                            info!(
                                sample_rate = config.stream.sample_rate,
                                buffer_size = config.stream.buffer_size,
                                "Audio session started"
                            );
                            let _ = event_sender.send(Event::Started);
                        }
                        Err(e) => {
                            error!("Failed to start audio session: {}", e);
                            let _ = event_sender.send(Event::error(e));
                        }
                    }
                }
                Ok(Command::Stop) => {
                    if stream.take().is_some() {
                        is_running.store(false, Ordering::SeqCst);
                        info!("Audio session stopped");
                        let _ = event_sender.send(Event::Stopped);
                    }
                }
                Ok(Command::ResetChain) => {
                    shared.request_reset();
                }
                Ok(Command::RequestState) => {
                    let _ = event_sender.send(Event::StateUpdate {
                        is_running: stream.is_some(),
                        is_bypassed: shared.bypassed.load(Ordering::Relaxed),
                        sample_rate: config.stream.sample_rate,
                        buffer_size: config.stream.buffer_size,
                    });
                }
                Ok(Command::Shutdown) => break,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }

        drop(stream);
        is_running.store(false, Ordering::SeqCst);
        info!("Audio thread stopped");
    }

    /// Build the session's FIFOs and streams, publishing the outlet
    fn start_session(
        config: &EngineConfig,
        params: &Arc<ParamTable>,
        shared: &Arc<SharedState>,
        event_sender: &Sender<Event>,
        outlet_sender: &Sender<SpectrumOutlet>,
    ) -> EngineResult<AudioStream> {
        let block_len = config.stream.buffer_size as usize;
        let capacity = config.analyzer_capacity_blocks;

        let (left_feed, left_blocks) = ChannelSampleFifo::new(block_len, capacity);
        let (right_feed, right_blocks) = ChannelSampleFifo::new(block_len, capacity);

        let capture_device = device::find_input_device(config.input_device.as_deref())?;
        let output_device = device::find_output_device(config.output_device.as_deref())?;

        let stream = AudioStream::new(
            config,
            &capture_device,
            &output_device,
            Arc::clone(params),
            Arc::clone(shared),
            (left_feed, right_feed),
            event_sender.clone(),
        )?;

        let outlet = SpectrumOutlet::new(
            left_blocks,
            right_blocks,
            block_len,
            config.stream.sample_rate as f32,
            Arc::clone(params),
        );
        outlet_sender
            .send(outlet)
            .map_err(|_| EngineError::ChannelSendError)?;

        Ok(stream)
    }

    /// Get all available devices
    pub fn list_devices(&self) -> EngineResult<Vec<crate::device::AudioDevice>> {
        crate::device::AudioDevice::enumerate_all()
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
        let _ = self.command_sender.send(Command::Shutdown);
        if let Some(handle) = self.audio_thread.take() {
            let _ = handle.join();
        }
    }
}
