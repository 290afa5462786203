//! Engine and Stream Configuration

use serde::{Deserialize, Serialize};

/// Audio stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of audio channels; the EQ processes exactly two
    pub channels: u16,

    /// Buffer size in frames (lower = less latency, higher = more stability)
    pub buffer_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            buffer_size: 512,
        }
    }
}

impl StreamConfig {
    /// Calculate latency in milliseconds for this configuration
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate < 8_000 || self.sample_rate > 192_000 {
            return Err(format!("Invalid sample rate: {}", self.sample_rate));
        }
        if self.channels != 2 {
            return Err(format!(
                "Invalid channel count: {} (stereo only)",
                self.channels
            ));
        }
        if self.buffer_size < 32 || self.buffer_size > 8192 {
            return Err(format!("Invalid buffer size: {}", self.buffer_size));
        }
        Ok(())
    }
}

/// Overall engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Stream configuration
    pub stream: StreamConfig,

    /// rtrb ring capacity in frames between capture and output callbacks
    /// (should be a multiple of buffer_size)
    pub ring_buffer_frames: usize,

    /// Capacity of each channel's analysis FIFO in blocks; sized for
    /// several hundred milliseconds so a slow consumer only costs
    /// temporal resolution
    pub analyzer_capacity_blocks: usize,

    /// Input device name, or None for the system default
    pub input_device: Option<String>,

    /// Output device name, or None for the system default
    pub output_device: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            // 4 buffers worth of ring buffer capacity
            ring_buffer_frames: 512 * 4,
            // ~512ms of audio at the default block size and sample rate
            analyzer_capacity_blocks: 48,
            input_device: None,
            output_device: None,
        }
    }
}

impl EngineConfig {
    /// Create config optimized for low latency
    pub fn low_latency() -> Self {
        Self {
            stream: StreamConfig {
                sample_rate: 48_000,
                channels: 2,
                buffer_size: 128, // ~2.6ms latency
            },
            ring_buffer_frames: 128 * 8,
            analyzer_capacity_blocks: 192,
            input_device: None,
            output_device: None,
        }
    }

    /// Create config optimized for stability
    pub fn stable() -> Self {
        Self {
            stream: StreamConfig {
                sample_rate: 48_000,
                channels: 2,
                buffer_size: 1024, // ~21ms latency
            },
            ring_buffer_frames: 1024 * 4,
            analyzer_capacity_blocks: 24,
            input_device: None,
            output_device: None,
        }
    }

    /// Seconds of audio the analysis FIFO can hold before overwriting
    pub fn analyzer_headroom_secs(&self) -> f32 {
        (self.analyzer_capacity_blocks as u32 * self.stream.buffer_size) as f32
            / self.stream.sample_rate as f32
    }
}
