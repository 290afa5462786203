//! Message Types for Thread Communication
//!
//! Commands flow from the control side to the audio thread; events flow
//! back. Band parameters do NOT travel over this channel - they live in
//! the shared [`crate::ParamTable`] so the audio thread can read them
//! without a queue in the way.

use serde::{Deserialize, Serialize};

/// Commands sent to the audio thread
#[derive(Debug, Clone)]
pub enum Command {
    /// Open the streams and start processing
    Start,

    /// Tear the streams down; parameters keep their values
    Stop,

    /// Clear the filter chain's delay lines on the next block
    ResetChain,

    /// Request current state (triggers a StateUpdate event)
    RequestState,

    /// Shut the audio thread down
    Shutdown,
}

/// Events sent from the audio thread
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Streams are up and the callback is running
    Started,

    /// Streams were torn down
    Stopped,

    /// Error occurred
    Error { message: String },

    /// Current state snapshot
    StateUpdate {
        is_running: bool,
        is_bypassed: bool,
        sample_rate: u32,
        buffer_size: u32,
    },

    /// The output callback ran dry (capture ring empty); audible as a
    /// glitch, visible as silence in the analyzer
    BufferUnderrun,
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }
}
