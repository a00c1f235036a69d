//! Playback control engine for a self-hosted media player.
//!
//! Coordinates an external media decode/render engine, user-driven seeking,
//! auto-hiding controls driven by an inactivity timer, discrete
//! playback-rate selection, and exclusive fullscreen — reconciling
//! independently-firing event sources into one consistent, observable state.
//!
//! The engine itself stays behind the [`MediaEngine`] trait; everything here
//! is testable without a live decoder. [`spawn`] wires a controller
//! into a single tokio task that serves a command channel, the engine event
//! stream, and the controls hide deadline.

mod config;
mod controller;
mod engine;
mod fullscreen;
mod macros;
mod runtime;
mod seek;
mod session;
mod visibility;

pub use config::{Config, ControlsSettings, PlaybackSettings};
pub use controller::PlayerController;
pub use engine::{MediaEngine, NullEngine};
pub use fullscreen::{FullscreenCapability, HolderId};
pub use runtime::{PlayerHandle, spawn};
pub use seek::pointer_fraction;
pub use session::PlaybackSession;
pub use visibility::ControlsVisibility;
