//! Common types for the playback control engine.
//!
//! This crate defines the shared data structures exchanged between the
//! controller runtime and its callers: user-intent commands flowing in
//! ([`PlayerCommand`]), state-change notifications flowing out
//! ([`PlayerEvent`]), the media-engine event surface ([`EngineEvent`]), and
//! the error taxonomy ([`ControlError`]).
//!
//! All types are JSON-serializable so commands and events can cross a
//! process boundary unchanged.
//!
//! # Examples
//!
//! ```
//! use common::{PlayerCommand, SeekBarRegion};
//!
//! // Map a pointer press on the progress bar into a seek command
//! let cmd = PlayerCommand::SeekToPointer {
//!     pointer_x: 320.0,
//!     region: SeekBarRegion { left: 40.0, width: 640.0 },
//! };
//!
//! let json = serde_json::to_string(&cmd).unwrap();
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discrete playback rates the controller accepts.
///
/// No other value is ever forwarded to the media engine.
pub const ALLOWED_RATES: [f64; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

/// Default delay before on-screen controls auto-hide during playback.
pub const DEFAULT_HIDE_DELAY_MS: u64 = 3000;

/// Check whether a rate is a member of [`ALLOWED_RATES`].
///
/// Comparison is exact: every allowed rate is an exactly representable
/// float and requests are expected to originate from the same fixed set.
pub fn is_allowed_rate(rate: f64) -> bool {
    ALLOWED_RATES.iter().any(|r| *r == rate)
}

/// Errors surfaced by dispatcher operations.
///
/// None of these abort the controller; each leaves the session in the
/// consistent prior state. They are serializable so a UI layer can display
/// or log them across a process boundary.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlError {
    /// The engine refused a `play()` request (e.g. an autoplay policy).
    /// The session remains `Paused`; no retry is attempted.
    #[error("engine rejected the play request")]
    EngineRejected,

    /// Seek or skip issued while the duration is unknown or zero.
    #[error("seek ignored: duration unknown or zero")]
    InvalidSeekTarget,

    /// Requested rate is not in the allowed discrete set.
    #[error("playback rate {0} is not an allowed value")]
    InvalidPlaybackRate(f64),

    /// The fullscreen capability is currently held by another controller.
    #[error("fullscreen capability is held by another controller")]
    FullscreenDenied,
}

/// Canonical playback state of one media session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No source mounted yet.
    #[default]
    Idle,
    /// Source assigned, waiting for engine metadata.
    Loading,
    /// Ready (or user-paused); not advancing.
    Paused,
    /// Actively advancing.
    Playing,
    /// Stalled mid-playback waiting for data.
    Buffering,
    /// Reached the end of the source.
    Ended,
}

impl PlaybackState {
    /// True only for [`PlaybackState::Playing`].
    ///
    /// Buffering deliberately counts as not-playing: the inactivity timer
    /// must never hide the controls while the session is stalled.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Events emitted asynchronously by the media engine.
///
/// Interleaving across event kinds is arbitrary; only `TimeProgressed` is
/// monotone while playing, and even that restarts across an accepted seek.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Source metadata became available.
    MetadataReady { duration: f64 },
    /// Playback position advanced (seconds).
    TimeProgressed { position: f64 },
    /// Playback reached the end of the source.
    Ended,
    /// The engine stalled waiting for data.
    BufferingStarted,
    /// The engine recovered from a stall.
    BufferingEnded,
}

/// Outcome of an engine `play()` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayOutcome {
    Accepted,
    Rejected,
}

/// Horizontal extent of the progress-bar region, in the same coordinate
/// space as the pointer events mapped onto it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekBarRegion {
    pub left: f32,
    pub width: f32,
}

/// User intents sent to the controller runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Toggle between playing and paused (play from `Ended` restarts).
    TogglePlay,
    /// Flip the mute flag without touching the volume level.
    ToggleMute,
    /// Set volume; clamped to `0..=100`. Zero force-mutes.
    SetVolume { volume: u8 },
    /// Seek to a fraction of the duration; clamped to `[0, 1]`.
    SeekTo { fraction: f64 },
    /// Seek from a pointer position within the progress-bar region.
    SeekToPointer {
        pointer_x: f32,
        region: SeekBarRegion,
    },
    /// Skip forward or backward by a signed number of seconds.
    Skip { delta_seconds: f64 },
    /// Select a playback rate from the allowed set; closes the rate menu.
    SetPlaybackRate { rate: f64 },
    /// Acquire or release the fullscreen capability.
    ToggleFullscreen,
    /// Open or close the playback-rate menu.
    ToggleRateMenu,
    /// Pointer moved inside the controller region; shows the controls and
    /// restarts the auto-hide window.
    PointerActivity,
    /// Request a full state snapshot (answered with [`PlayerEvent::Status`]).
    Query,
    /// Tear the session down and stop the runtime.
    Shutdown,
}

/// Notifications published by the controller runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    StateChanged(PlaybackState),
    PositionChanged { position: f64, progress_percent: f64 },
    DurationChanged(f64),
    VolumeChanged { volume: u8, muted: bool },
    RateChanged(f64),
    VisibilityChanged(bool),
    FullscreenChanged(bool),
    RateMenuChanged(bool),
    /// Reply to [`PlayerCommand::Query`].
    Status(PlayerSnapshot),
    /// A dispatched command was refused; the session state did not change.
    CommandFailed(ControlError),
}

/// Full observable state of the controller at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub state: PlaybackState,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub progress_percent: f64,
    pub volume: u8,
    pub muted: bool,
    pub playback_rate: f64,
    pub controls_visible: bool,
    pub rate_menu_open: bool,
    pub is_fullscreen: bool,
}
