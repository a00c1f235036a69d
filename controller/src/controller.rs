use std::time::Instant;

use common::{ControlError, PlayOutcome, PlaybackState, PlayerSnapshot, SeekBarRegion, is_allowed_rate};

use crate::config::Config;
use crate::engine::MediaEngine;
use crate::fullscreen::{FullscreenCapability, HolderId};
use crate::seek::pointer_fraction;
use crate::session::PlaybackSession;
use crate::visibility::ControlsVisibility;
use crate::log_and_continue;

/// Command dispatcher for one playback session.
///
/// The single entry point for user intents: every operation validates its
/// input, forwards to the media engine, and applies the optimistic state
/// update. The controller is the sole mutator of its [`PlaybackSession`];
/// engine events are reconciled through [`apply_engine_event`].
///
/// Operations never panic. Refused requests come back as [`ControlError`]
/// values so failures stay visible and testable instead of being swallowed.
///
/// [`apply_engine_event`]: PlayerController::apply_engine_event
pub struct PlayerController<E: MediaEngine> {
    engine: E,
    session: PlaybackSession,
    visibility: ControlsVisibility,
    rate_menu_open: bool,
    fullscreen: FullscreenCapability,
    holder: HolderId,
    is_fullscreen: bool,
    autoplay: bool,
    skip_step_seconds: f64,
}

impl<E: MediaEngine> PlayerController<E> {
    /// Mount a source: pushes the configured initial volume and rate to the
    /// engine and moves the session to `Loading`.
    pub fn new(mut engine: E, config: &Config, fullscreen: FullscreenCapability) -> Self {
        let volume = config.playback.initial_volume.min(100);
        let rate = if is_allowed_rate(config.playback.initial_rate) {
            config.playback.initial_rate
        } else {
            1.0
        };

        engine.set_volume(f64::from(volume) / 100.0);
        engine.set_playback_rate(rate);

        let mut session = PlaybackSession::new(volume, rate);
        session.mount();

        let holder = fullscreen.register();
        let hide_delay = std::time::Duration::from_millis(config.controls.hide_delay_ms);

        log::info!(
            "Playback controller mounted (autoplay: {}, hide delay: {}ms)",
            config.playback.autoplay,
            config.controls.hide_delay_ms
        );

        Self {
            engine,
            session,
            visibility: ControlsVisibility::new(hide_delay),
            rate_menu_open: false,
            fullscreen,
            holder,
            is_fullscreen: false,
            autoplay: config.playback.autoplay,
            skip_step_seconds: config.playback.skip_step_seconds,
        }
    }

    /// Toggle between playing and paused.
    ///
    /// Pause applies immediately; play is subject to engine acceptance and
    /// leaves the session `Paused` when rejected. Before metadata arrives
    /// the toggle is ignored.
    pub fn toggle_play(&mut self, now: Instant) -> Result<(), ControlError> {
        match self.session.state() {
            PlaybackState::Playing | PlaybackState::Buffering => {
                self.engine.pause();
                self.session.pause();
                self.visibility.sync_playing(now, false);
                Ok(())
            }
            PlaybackState::Paused | PlaybackState::Ended => match self.engine.play() {
                PlayOutcome::Accepted => {
                    self.session.confirm_play();
                    self.visibility.sync_playing(now, true);
                    Ok(())
                }
                PlayOutcome::Rejected => {
                    log::warn!("Engine rejected play request, staying paused");
                    Err(ControlError::EngineRejected)
                }
            },
            PlaybackState::Idle | PlaybackState::Loading => {
                log::debug!("Play toggle ignored before metadata");
                Ok(())
            }
        }
    }

    /// Flip the mute flag. Does not change the volume level, and raising the
    /// volume later will not clear the flag.
    pub fn toggle_mute(&mut self) -> Result<(), ControlError> {
        let muted = !self.session.muted();
        self.engine.set_muted(muted);
        self.session.set_muted(muted);
        Ok(())
    }

    /// Set the volume level, clamped to `0..=100`. Zero force-mutes.
    pub fn set_volume(&mut self, volume: u8) -> Result<(), ControlError> {
        let volume = volume.min(100);
        self.engine.set_volume(f64::from(volume) / 100.0);
        self.session.set_volume(volume);

        if volume == 0 && !self.session.muted() {
            self.engine.set_muted(true);
            self.session.set_muted(true);
        }
        Ok(())
    }

    /// Seek to a fraction of the duration, clamped to `[0, 1]`.
    pub fn seek_to(&mut self, fraction: f64) -> Result<(), ControlError> {
        let duration = self.known_duration()?;
        self.request_seek(fraction.clamp(0.0, 1.0) * duration)
    }

    /// Seek from a pointer position within the progress-bar region.
    pub fn seek_to_pointer(
        &mut self,
        pointer_x: f32,
        region: SeekBarRegion,
    ) -> Result<(), ControlError> {
        self.seek_to(pointer_fraction(region, pointer_x))
    }

    /// Skip forward or backward, clamped to `[0, duration]`.
    pub fn skip(&mut self, delta_seconds: f64) -> Result<(), ControlError> {
        self.known_duration()?;
        self.request_seek(self.session.current_time() + delta_seconds)
    }

    /// Skip by the configured default step.
    pub fn skip_forward(&mut self) -> Result<(), ControlError> {
        self.skip(self.skip_step_seconds)
    }

    /// Skip backward by the configured default step.
    pub fn skip_backward(&mut self) -> Result<(), ControlError> {
        self.skip(-self.skip_step_seconds)
    }

    /// Select a playback rate. Anything outside the allowed set is refused
    /// without touching state; a valid selection closes the rate menu.
    pub fn set_playback_rate(&mut self, rate: f64) -> Result<(), ControlError> {
        if !is_allowed_rate(rate) {
            log::debug!("Rejected playback rate {}", rate);
            return Err(ControlError::InvalidPlaybackRate(rate));
        }
        self.engine.set_playback_rate(rate);
        self.session.set_playback_rate(rate);
        self.rate_menu_open = false;
        Ok(())
    }

    /// Acquire or release the exclusive fullscreen capability.
    pub fn toggle_fullscreen(&mut self) -> Result<(), ControlError> {
        if self.is_fullscreen {
            log_and_continue!(
                self.fullscreen.release(self.holder),
                "release fullscreen capability"
            );
            self.is_fullscreen = false;
            Ok(())
        } else if self.fullscreen.request_exclusive(self.holder) {
            self.is_fullscreen = true;
            Ok(())
        } else {
            log::debug!("Fullscreen request denied: capability held elsewhere");
            Err(ControlError::FullscreenDenied)
        }
    }

    /// Open or close the playback-rate menu. The menu is transient UI state
    /// and never touches the session.
    pub fn toggle_rate_menu(&mut self) -> Result<(), ControlError> {
        self.rate_menu_open = !self.rate_menu_open;
        Ok(())
    }

    /// Pointer activity inside the controller region: shows the controls
    /// and restarts the auto-hide window while playing.
    pub fn pointer_activity(&mut self, now: Instant) {
        self.visibility
            .note_activity(now, self.session.state().is_playing());
    }

    /// Reconcile an asynchronous engine event into the canonical state.
    ///
    /// Returns an error only for a rejected autoplay attempt; the session
    /// stays `Paused` in that case.
    pub fn apply_engine_event(
        &mut self,
        event: common::EngineEvent,
        now: Instant,
    ) -> Result<(), ControlError> {
        let was_loading = self.session.state() == PlaybackState::Loading;
        self.session.apply_event(event);
        self.visibility
            .sync_playing(now, self.session.state().is_playing());

        // Metadata just arrived; honor a pending autoplay request once.
        if was_loading && self.session.state() == PlaybackState::Paused && self.autoplay {
            self.autoplay = false;
            match self.engine.play() {
                PlayOutcome::Accepted => {
                    self.session.confirm_play();
                    self.visibility.sync_playing(now, true);
                }
                PlayOutcome::Rejected => {
                    log::warn!("Autoplay rejected by engine, staying paused");
                    return Err(ControlError::EngineRejected);
                }
            }
        }
        Ok(())
    }

    /// Fire the controls hide deadline if it is due.
    pub fn on_hide_deadline(&mut self, now: Instant) {
        if self
            .visibility
            .fire_if_due(now, self.session.state().is_playing())
        {
            log::debug!("Controls hidden after inactivity");
        }
    }

    /// The pending auto-hide deadline the runtime should sleep toward.
    pub fn hide_deadline(&self) -> Option<Instant> {
        self.visibility.hide_deadline()
    }

    /// Full observable state at this instant.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.session.state(),
            current_time: self.session.current_time(),
            duration: self.session.duration(),
            progress_percent: self.session.progress_percent(),
            volume: self.session.volume(),
            muted: self.session.muted(),
            playback_rate: self.session.playback_rate(),
            controls_visible: self.visibility.visible(),
            rate_menu_open: self.rate_menu_open,
            is_fullscreen: self.is_fullscreen,
        }
    }

    /// Tear the session down: cancel the hide timer and release the
    /// fullscreen capability. Each step is non-fatal; teardown always runs
    /// to completion.
    pub fn teardown(&mut self) {
        log::info!("Tearing down playback session");
        self.visibility.cancel();
        if self.is_fullscreen {
            log_and_continue!(
                self.fullscreen.release(self.holder),
                "release fullscreen capability"
            );
            self.is_fullscreen = false;
        }
    }

    fn known_duration(&self) -> Result<f64, ControlError> {
        match self.session.duration() {
            Some(duration) if duration > 0.0 => Ok(duration),
            _ => Err(ControlError::InvalidSeekTarget),
        }
    }

    fn request_seek(&mut self, target: f64) -> Result<(), ControlError> {
        let duration = self.known_duration()?;
        let clamped = target.clamp(0.0, duration);
        self.engine.set_current_time(clamped);
        self.session.begin_seek(clamped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::EngineEvent;
    use std::sync::{Arc, Mutex};

    /// Records every engine call; play outcome is scripted per test.
    #[derive(Clone, Default)]
    struct RecordingEngine {
        calls: Arc<Mutex<Vec<String>>>,
        reject_play: bool,
    }

    impl RecordingEngine {
        fn rejecting() -> Self {
            Self {
                reject_play: true,
                ..Self::default()
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl MediaEngine for RecordingEngine {
        fn play(&mut self) -> PlayOutcome {
            self.record("play".into());
            if self.reject_play {
                PlayOutcome::Rejected
            } else {
                PlayOutcome::Accepted
            }
        }

        fn pause(&mut self) {
            self.record("pause".into());
        }

        fn set_current_time(&mut self, seconds: f64) {
            self.record(format!("seek:{}", seconds));
        }

        fn set_volume(&mut self, volume: f64) {
            self.record(format!("volume:{}", volume));
        }

        fn set_muted(&mut self, muted: bool) {
            self.record(format!("muted:{}", muted));
        }

        fn set_playback_rate(&mut self, rate: f64) {
            self.record(format!("rate:{}", rate));
        }
    }

    fn loaded_controller(
        engine: RecordingEngine,
        duration: f64,
    ) -> PlayerController<RecordingEngine> {
        let mut controller =
            PlayerController::new(engine, &Config::default(), FullscreenCapability::new());
        controller
            .apply_engine_event(EngineEvent::MetadataReady { duration }, Instant::now())
            .unwrap();
        controller
    }

    #[test]
    fn test_toggle_play_roundtrip() {
        let engine = RecordingEngine::default();
        let mut controller = loaded_controller(engine.clone(), 120.0);
        let now = Instant::now();

        controller.toggle_play(now).unwrap();
        assert_eq!(controller.snapshot().state, PlaybackState::Playing);

        controller.toggle_play(now).unwrap();
        assert_eq!(controller.snapshot().state, PlaybackState::Paused);

        let calls = engine.calls();
        assert!(calls.contains(&"play".to_string()));
        assert!(calls.contains(&"pause".to_string()));
    }

    #[test]
    fn test_play_rejection_stays_paused() {
        let mut controller = loaded_controller(RecordingEngine::rejecting(), 120.0);

        let result = controller.toggle_play(Instant::now());
        assert_eq!(result, Err(ControlError::EngineRejected));
        assert_eq!(controller.snapshot().state, PlaybackState::Paused);
    }

    #[test]
    fn test_toggle_before_metadata_is_ignored() {
        let engine = RecordingEngine::default();
        let mut controller = PlayerController::new(
            engine.clone(),
            &Config::default(),
            FullscreenCapability::new(),
        );

        controller.toggle_play(Instant::now()).unwrap();
        assert_eq!(controller.snapshot().state, PlaybackState::Loading);
        assert!(!engine.calls().contains(&"play".to_string()));
    }

    #[test]
    fn test_volume_zero_forces_mute() {
        let mut controller = loaded_controller(RecordingEngine::default(), 120.0);

        controller.set_volume(0).unwrap();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.volume, 0);
        assert!(snapshot.muted);

        // Raising the volume does not clear the mute.
        controller.set_volume(50).unwrap();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.volume, 50);
        assert!(snapshot.muted);
    }

    #[test]
    fn test_toggle_mute_preserves_volume() {
        let mut controller = loaded_controller(RecordingEngine::default(), 120.0);
        controller.set_volume(70).unwrap();

        controller.toggle_mute().unwrap();
        let snapshot = controller.snapshot();
        assert!(snapshot.muted);
        assert_eq!(snapshot.volume, 70);

        controller.toggle_mute().unwrap();
        assert!(!controller.snapshot().muted);
    }

    #[test]
    fn test_seek_to_fraction() {
        // Scenario: duration 200, seek to the midpoint.
        let engine = RecordingEngine::default();
        let mut controller = loaded_controller(engine.clone(), 200.0);

        controller.seek_to(0.5).unwrap();
        assert_eq!(controller.snapshot().current_time, 100.0);
        assert!(engine.calls().contains(&"seek:100".to_string()));

        // Out-of-range fractions clamp.
        controller.seek_to(2.0).unwrap();
        assert_eq!(controller.snapshot().current_time, 200.0);
        controller.seek_to(-1.0).unwrap();
        assert_eq!(controller.snapshot().current_time, 0.0);
    }

    #[test]
    fn test_skip_clamps_to_bounds() {
        // Scenario: duration 120, position 5, skip(-10) lands on 0.
        let mut controller = loaded_controller(RecordingEngine::default(), 120.0);
        controller
            .apply_engine_event(EngineEvent::TimeProgressed { position: 5.0 }, Instant::now())
            .unwrap();

        controller.skip(-10.0).unwrap();
        assert_eq!(controller.snapshot().current_time, 0.0);

        controller.skip(500.0).unwrap();
        assert_eq!(controller.snapshot().current_time, 120.0);
    }

    #[test]
    fn test_seek_without_duration_is_refused() {
        let engine = RecordingEngine::default();
        let mut controller = PlayerController::new(
            engine.clone(),
            &Config::default(),
            FullscreenCapability::new(),
        );

        assert_eq!(controller.seek_to(0.5), Err(ControlError::InvalidSeekTarget));
        assert_eq!(controller.skip(10.0), Err(ControlError::InvalidSeekTarget));
        assert!(!engine.calls().iter().any(|c| c.starts_with("seek:")));
    }

    #[test]
    fn test_seek_to_pointer_maps_region() {
        let mut controller = loaded_controller(RecordingEngine::default(), 100.0);
        let region = SeekBarRegion {
            left: 0.0,
            width: 400.0,
        };

        controller.seek_to_pointer(100.0, region).unwrap();
        assert_eq!(controller.snapshot().current_time, 25.0);
    }

    #[test]
    fn test_playback_rate_validation() {
        let engine = RecordingEngine::default();
        let mut controller = loaded_controller(engine.clone(), 100.0);

        controller.toggle_rate_menu().unwrap();
        assert!(controller.snapshot().rate_menu_open);

        // An invalid rate is refused and leaves the menu open.
        assert_eq!(
            controller.set_playback_rate(0.9),
            Err(ControlError::InvalidPlaybackRate(0.9))
        );
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.playback_rate, 1.0);
        assert!(snapshot.rate_menu_open);
        assert!(!engine.calls().contains(&"rate:0.9".to_string()));

        // A valid selection applies and closes the menu.
        controller.set_playback_rate(1.5).unwrap();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.playback_rate, 1.5);
        assert!(!snapshot.rate_menu_open);
    }

    #[test]
    fn test_skip_defaults_use_configured_step() {
        let mut config = Config::default();
        config.playback.skip_step_seconds = 15.0;
        let mut controller = PlayerController::new(
            RecordingEngine::default(),
            &config,
            FullscreenCapability::new(),
        );
        controller
            .apply_engine_event(
                EngineEvent::MetadataReady { duration: 100.0 },
                Instant::now(),
            )
            .unwrap();

        controller.skip_forward().unwrap();
        assert_eq!(controller.snapshot().current_time, 15.0);
        controller.skip_backward().unwrap();
        assert_eq!(controller.snapshot().current_time, 0.0);
    }

    #[test]
    fn test_fullscreen_contention() {
        let capability = FullscreenCapability::new();
        let mut first = PlayerController::new(
            RecordingEngine::default(),
            &Config::default(),
            capability.clone(),
        );
        let mut second = PlayerController::new(
            RecordingEngine::default(),
            &Config::default(),
            capability.clone(),
        );

        first.toggle_fullscreen().unwrap();
        assert!(first.snapshot().is_fullscreen);

        assert_eq!(
            second.toggle_fullscreen(),
            Err(ControlError::FullscreenDenied)
        );
        assert!(!second.snapshot().is_fullscreen);

        first.toggle_fullscreen().unwrap();
        assert!(!first.snapshot().is_fullscreen);
        second.toggle_fullscreen().unwrap();
        assert!(second.snapshot().is_fullscreen);
    }

    #[test]
    fn test_autoplay_attempts_once_on_metadata() {
        let engine = RecordingEngine::default();
        let mut config = Config::default();
        config.playback.autoplay = true;
        let mut controller =
            PlayerController::new(engine.clone(), &config, FullscreenCapability::new());

        controller
            .apply_engine_event(
                EngineEvent::MetadataReady { duration: 100.0 },
                Instant::now(),
            )
            .unwrap();
        assert_eq!(controller.snapshot().state, PlaybackState::Playing);

        // A duplicate metadata event must not re-trigger the attempt.
        let plays_before = engine.calls().iter().filter(|c| *c == "play").count();
        controller
            .apply_engine_event(
                EngineEvent::MetadataReady { duration: 100.0 },
                Instant::now(),
            )
            .unwrap();
        let plays_after = engine.calls().iter().filter(|c| *c == "play").count();
        assert_eq!(plays_before, plays_after);
    }

    #[test]
    fn test_autoplay_rejection_stays_paused() {
        let mut config = Config::default();
        config.playback.autoplay = true;
        let mut controller = PlayerController::new(
            RecordingEngine::rejecting(),
            &config,
            FullscreenCapability::new(),
        );

        let result = controller.apply_engine_event(
            EngineEvent::MetadataReady { duration: 100.0 },
            Instant::now(),
        );
        assert_eq!(result, Err(ControlError::EngineRejected));
        assert_eq!(controller.snapshot().state, PlaybackState::Paused);
    }

    #[test]
    fn test_buffering_keeps_controls_visible() {
        let mut controller = loaded_controller(RecordingEngine::default(), 100.0);
        let now = Instant::now();
        controller.toggle_play(now).unwrap();
        assert!(controller.hide_deadline().is_some());

        controller
            .apply_engine_event(EngineEvent::BufferingStarted, now)
            .unwrap();
        assert_eq!(controller.snapshot().state, PlaybackState::Buffering);
        assert!(controller.hide_deadline().is_none());
        assert!(controller.snapshot().controls_visible);

        controller
            .apply_engine_event(EngineEvent::BufferingEnded, now)
            .unwrap();
        assert_eq!(controller.snapshot().state, PlaybackState::Playing);
        assert!(controller.hide_deadline().is_some());
    }

    #[test]
    fn test_hide_deadline_hides_controls_while_playing() {
        let mut controller = loaded_controller(RecordingEngine::default(), 100.0);
        let now = Instant::now();
        controller.toggle_play(now).unwrap();

        let deadline = controller.hide_deadline().unwrap();
        controller.on_hide_deadline(deadline);
        assert!(!controller.snapshot().controls_visible);

        // Activity restores them and re-arms the window.
        controller.pointer_activity(deadline);
        assert!(controller.snapshot().controls_visible);
        assert!(controller.hide_deadline().is_some());
    }

    #[test]
    fn test_pause_cancels_pending_hide() {
        let mut controller = loaded_controller(RecordingEngine::default(), 100.0);
        let now = Instant::now();
        controller.toggle_play(now).unwrap();
        let deadline = controller.hide_deadline().unwrap();

        controller.toggle_play(now).unwrap();
        assert!(controller.hide_deadline().is_none());

        controller.on_hide_deadline(deadline);
        assert!(controller.snapshot().controls_visible);
    }

    #[test]
    fn test_restart_after_ended() {
        let mut controller = loaded_controller(RecordingEngine::default(), 100.0);
        let now = Instant::now();
        controller.toggle_play(now).unwrap();
        controller
            .apply_engine_event(EngineEvent::Ended, now)
            .unwrap();
        assert_eq!(controller.snapshot().state, PlaybackState::Ended);
        assert_eq!(controller.snapshot().current_time, 100.0);

        // Explicit seek then play re-enters playback.
        controller.seek_to(0.0).unwrap();
        controller.toggle_play(now).unwrap();
        assert_eq!(controller.snapshot().state, PlaybackState::Playing);
        assert_eq!(controller.snapshot().current_time, 0.0);
    }

    #[test]
    fn test_teardown_releases_fullscreen_and_timer() {
        let capability = FullscreenCapability::new();
        let mut controller = PlayerController::new(
            RecordingEngine::default(),
            &Config::default(),
            capability.clone(),
        );
        controller
            .apply_engine_event(
                EngineEvent::MetadataReady { duration: 100.0 },
                Instant::now(),
            )
            .unwrap();
        controller.toggle_play(Instant::now()).unwrap();
        controller.toggle_fullscreen().unwrap();
        assert!(capability.current_holder().is_some());
        assert!(controller.hide_deadline().is_some());

        controller.teardown();
        assert!(capability.current_holder().is_none());
        assert!(controller.hide_deadline().is_none());
    }
}
