use std::time::{Duration, Instant};

/// Transient visibility of the on-screen controls.
///
/// The hide timer follows a cancel-and-reschedule discipline: every activity
/// signal replaces the pending deadline, so at most one exists at a time. A
/// hide may only be scheduled, and may only fire, while the session is
/// playing; leaving playback cancels the deadline and restores the controls.
///
/// The type is a plain value over [`Instant`]s so the debounce contract is
/// unit-testable without any timer runtime; the runtime loop owns the actual
/// sleep.
#[derive(Debug, Clone)]
pub struct ControlsVisibility {
    visible: bool,
    hide_deadline: Option<Instant>,
    hide_delay: Duration,
}

impl ControlsVisibility {
    /// Controls start visible with no hide scheduled.
    pub fn new(hide_delay: Duration) -> Self {
        Self {
            visible: true,
            hide_deadline: None,
            hide_delay,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// The pending auto-hide deadline, if one is scheduled.
    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_deadline
    }

    /// Pointer activity inside the controller region.
    ///
    /// Shows the controls and, while playing, restarts the hide window.
    pub fn note_activity(&mut self, now: Instant, playing: bool) {
        self.visible = true;
        self.hide_deadline = playing.then(|| now + self.hide_delay);
    }

    /// Reconcile with the session's playing flag after a state transition.
    ///
    /// Entering playback starts a fresh hide window if none is pending;
    /// leaving playback cancels it and forces the controls visible, so
    /// `visible == false` is unreachable outside playback.
    pub fn sync_playing(&mut self, now: Instant, playing: bool) {
        if playing {
            if self.visible && self.hide_deadline.is_none() {
                self.hide_deadline = Some(now + self.hide_delay);
            }
        } else {
            self.hide_deadline = None;
            self.visible = true;
        }
    }

    /// Fire the deadline if it is due. Returns true when the controls were
    /// hidden by this call.
    pub fn fire_if_due(&mut self, now: Instant, playing: bool) -> bool {
        match self.hide_deadline {
            Some(deadline) if now >= deadline => {
                self.hide_deadline = None;
                if playing {
                    self.visible = false;
                    true
                } else {
                    // Stale deadline; the cancel on leaving playback wins.
                    false
                }
            }
            _ => false,
        }
    }

    /// Drop any pending deadline without touching visibility (teardown).
    pub fn cancel(&mut self) {
        self.hide_deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(3000);

    #[test]
    fn test_starts_visible_without_deadline() {
        let visibility = ControlsVisibility::new(DELAY);
        assert!(visibility.visible());
        assert!(visibility.hide_deadline().is_none());
    }

    #[test]
    fn test_hide_fires_only_while_playing() {
        let now = Instant::now();
        let mut visibility = ControlsVisibility::new(DELAY);

        visibility.note_activity(now, false);
        assert!(visibility.hide_deadline().is_none());

        visibility.note_activity(now, true);
        assert_eq!(visibility.hide_deadline(), Some(now + DELAY));

        assert!(!visibility.fire_if_due(now + DELAY - Duration::from_millis(1), true));
        assert!(visibility.visible());

        assert!(visibility.fire_if_due(now + DELAY, true));
        assert!(!visibility.visible());
        assert!(visibility.hide_deadline().is_none());
    }

    #[test]
    fn test_activity_debounces_to_one_deadline() {
        let now = Instant::now();
        let mut visibility = ControlsVisibility::new(DELAY);

        visibility.note_activity(now, true);
        visibility.note_activity(now + Duration::from_millis(1000), true);
        visibility.note_activity(now + Duration::from_millis(2000), true);

        // Only the last activity counts.
        let expected = now + Duration::from_millis(2000) + DELAY;
        assert_eq!(visibility.hide_deadline(), Some(expected));

        assert!(!visibility.fire_if_due(now + DELAY, true));
        assert!(visibility.visible());
        assert!(visibility.fire_if_due(expected, true));
        assert!(!visibility.visible());
    }

    #[test]
    fn test_pause_before_deadline_keeps_controls_visible() {
        let now = Instant::now();
        let mut visibility = ControlsVisibility::new(DELAY);

        visibility.note_activity(now, true);
        visibility.sync_playing(now + Duration::from_millis(500), false);
        assert!(visibility.hide_deadline().is_none());
        assert!(visibility.visible());

        // Even far past the original deadline nothing fires.
        assert!(!visibility.fire_if_due(now + DELAY * 10, false));
        assert!(visibility.visible());
    }

    #[test]
    fn test_stale_deadline_does_not_hide_when_not_playing() {
        let now = Instant::now();
        let mut visibility = ControlsVisibility::new(DELAY);

        visibility.note_activity(now, true);
        assert!(!visibility.fire_if_due(now + DELAY, false));
        assert!(visibility.visible());
    }

    #[test]
    fn test_entering_playback_schedules_hide() {
        let now = Instant::now();
        let mut visibility = ControlsVisibility::new(DELAY);

        visibility.sync_playing(now, true);
        assert_eq!(visibility.hide_deadline(), Some(now + DELAY));

        // Re-syncing while a deadline is pending does not reschedule.
        visibility.sync_playing(now + Duration::from_millis(1000), true);
        assert_eq!(visibility.hide_deadline(), Some(now + DELAY));
    }

    #[test]
    fn test_hidden_controls_stay_hidden_across_sync() {
        let now = Instant::now();
        let mut visibility = ControlsVisibility::new(DELAY);

        visibility.sync_playing(now, true);
        assert!(visibility.fire_if_due(now + DELAY, true));
        assert!(!visibility.visible());

        // Periodic syncs while still playing do not re-arm the timer.
        visibility.sync_playing(now + DELAY + Duration::from_millis(100), true);
        assert!(visibility.hide_deadline().is_none());
        assert!(!visibility.visible());

        // Activity brings them back.
        visibility.note_activity(now + DELAY + Duration::from_millis(200), true);
        assert!(visibility.visible());
        assert!(visibility.hide_deadline().is_some());
    }

    #[test]
    fn test_cancel_drops_deadline() {
        let now = Instant::now();
        let mut visibility = ControlsVisibility::new(DELAY);

        visibility.note_activity(now, true);
        visibility.cancel();
        assert!(visibility.hide_deadline().is_none());
        assert!(!visibility.fire_if_due(now + DELAY, true));
    }
}
