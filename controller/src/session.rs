use common::{EngineEvent, PlaybackState};

/// Canonical state record for one mounted media source.
///
/// Owned exclusively by the controller instance; the command dispatcher is
/// the only mutator. Engine events are applied through [`apply_event`],
/// which is idempotent under duplicate or out-of-order delivery.
///
/// [`apply_event`]: PlaybackSession::apply_event
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    state: PlaybackState,

    /// Position in seconds. Authoritative value comes from the engine's
    /// `TimeProgressed` events, but an in-flight seek sets it optimistically.
    current_time: f64,

    /// Unknown until the engine reports metadata.
    duration: Option<f64>,

    /// Volume level, 0-100.
    volume: u8,

    muted: bool,

    /// Always a member of [`common::ALLOWED_RATES`].
    playback_rate: f64,

    /// A seek was forwarded to the engine and has not yet been confirmed
    /// by a `TimeProgressed` event.
    seek_in_flight: bool,
}

impl PlaybackSession {
    /// Create a session in `Idle` with the given initial volume and rate.
    pub fn new(volume: u8, playback_rate: f64) -> Self {
        Self {
            state: PlaybackState::Idle,
            current_time: 0.0,
            duration: None,
            volume: volume.min(100),
            muted: false,
            playback_rate,
            seek_in_flight: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn seek_in_flight(&self) -> bool {
        self.seek_in_flight
    }

    /// Derived progress, always within `[0, 100]`.
    ///
    /// Zero while the duration is unknown or zero.
    pub fn progress_percent(&self) -> f64 {
        match self.duration {
            Some(duration) if duration > 0.0 => {
                (self.current_time / duration * 100.0).clamp(0.0, 100.0)
            }
            _ => 0.0,
        }
    }

    /// Source assignment: `Idle -> Loading`.
    pub fn mount(&mut self) {
        if self.state == PlaybackState::Idle {
            self.set_state(PlaybackState::Loading);
        }
    }

    /// Dispatcher confirmed an accepted play request.
    pub fn confirm_play(&mut self) {
        self.set_state(PlaybackState::Playing);
    }

    /// Dispatcher issued a pause (assumed synchronous, non-rejecting).
    pub fn pause(&mut self) {
        self.set_state(PlaybackState::Paused);
    }

    /// Record an optimistic seek target already clamped to `[0, duration]`.
    pub fn begin_seek(&mut self, target: f64) {
        self.current_time = target.max(0.0);
        self.seek_in_flight = true;
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        self.playback_rate = rate;
    }

    /// Apply one engine event, reconciling the canonical state.
    ///
    /// Safe to call with duplicates: re-applying an event never corrupts
    /// state. A `BufferingEnded` with no prior `BufferingStarted` is a no-op.
    pub fn apply_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::MetadataReady { duration } => self.on_metadata_ready(duration),
            EngineEvent::TimeProgressed { position } => self.on_time_progressed(position),
            EngineEvent::Ended => self.on_ended(),
            EngineEvent::BufferingStarted => self.on_buffering_started(),
            EngineEvent::BufferingEnded => self.on_buffering_ended(),
        }
    }

    fn on_metadata_ready(&mut self, duration: f64) {
        self.duration = Some(duration.max(0.0));
        // A duplicate after leaving Loading only refreshes the duration.
        if self.state == PlaybackState::Loading {
            self.set_state(PlaybackState::Paused);
        }
    }

    fn on_time_progressed(&mut self, position: f64) {
        // A jump after an accepted seek is legitimate, not a regression.
        self.seek_in_flight = false;
        self.current_time = match self.duration {
            Some(duration) => position.clamp(0.0, duration),
            None => position.max(0.0),
        };
    }

    fn on_ended(&mut self) {
        if matches!(
            self.state,
            PlaybackState::Playing | PlaybackState::Buffering
        ) {
            if let Some(duration) = self.duration {
                self.current_time = duration;
            }
            self.set_state(PlaybackState::Ended);
        }
    }

    fn on_buffering_started(&mut self) {
        if self.state == PlaybackState::Playing {
            self.set_state(PlaybackState::Buffering);
        }
    }

    fn on_buffering_ended(&mut self) {
        // Strict pairing: without a prior BufferingStarted this is a no-op.
        if self.state == PlaybackState::Buffering {
            self.set_state(PlaybackState::Playing);
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            log::debug!("playback state: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}
