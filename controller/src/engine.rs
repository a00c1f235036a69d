use common::PlayOutcome;

/// Imperative control surface of the external media decode/render engine.
///
/// Calls never block: anything that takes time resolves later through the
/// [`common::EngineEvent`] stream the engine feeds into the runtime. Only
/// `play` carries an acceptance signal (platforms may refuse unprompted
/// playback); `pause` is assumed synchronous and non-rejecting.
///
/// Exactly one controller owns an engine instance at a time.
pub trait MediaEngine: Send + 'static {
    /// Request playback. A rejection leaves the engine paused.
    fn play(&mut self) -> PlayOutcome;

    fn pause(&mut self);

    /// Jump to an absolute position in seconds (already clamped by the
    /// dispatcher).
    fn set_current_time(&mut self, seconds: f64);

    /// Output gain in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f64);

    fn set_muted(&mut self, muted: bool);

    /// Rate is guaranteed to come from [`common::ALLOWED_RATES`].
    fn set_playback_rate(&mut self, rate: f64);
}

/// Engine stand-in that accepts every request and renders nothing.
///
/// Useful for headless operation and as a default in tests that only
/// exercise the state machine.
#[derive(Debug, Default)]
pub struct NullEngine;

impl MediaEngine for NullEngine {
    fn play(&mut self) -> PlayOutcome {
        PlayOutcome::Accepted
    }

    fn pause(&mut self) {}

    fn set_current_time(&mut self, _seconds: f64) {}

    fn set_volume(&mut self, _volume: f64) {}

    fn set_muted(&mut self, _muted: bool) {}

    fn set_playback_rate(&mut self, _rate: f64) {}
}
