use std::time::Instant;

use common::{EngineEvent, PlayerCommand, PlayerEvent, PlayerSnapshot};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::controller::PlayerController;
use crate::engine::MediaEngine;
use crate::fullscreen::FullscreenCapability;

/// Channel pair connecting a caller to a running controller task.
///
/// Dropping the command sender shuts the runtime down the same way an
/// explicit [`PlayerCommand::Shutdown`] does.
pub struct PlayerHandle {
    pub commands: mpsc::UnboundedSender<PlayerCommand>,
    pub events: mpsc::UnboundedReceiver<PlayerEvent>,
}

/// Spawn a controller runtime onto the current tokio runtime.
///
/// The task serves three inputs from a single `select!` loop: user commands,
/// engine events, and the controls auto-hide deadline. All state lives
/// inside the task; callers observe it through the published
/// [`PlayerEvent`] stream (an initial [`PlayerEvent::Status`] is emitted
/// immediately).
pub fn spawn<E: MediaEngine>(
    engine: E,
    engine_events: mpsc::UnboundedReceiver<EngineEvent>,
    config: Config,
    fullscreen: FullscreenCapability,
) -> PlayerHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    tokio::spawn(run(engine, cmd_rx, engine_events, event_tx, config, fullscreen));

    PlayerHandle {
        commands: cmd_tx,
        events: event_rx,
    }
}

async fn run<E: MediaEngine>(
    engine: E,
    mut cmd_rx: mpsc::UnboundedReceiver<PlayerCommand>,
    mut engine_rx: mpsc::UnboundedReceiver<EngineEvent>,
    event_tx: mpsc::UnboundedSender<PlayerEvent>,
    config: Config,
    fullscreen: FullscreenCapability,
) {
    let mut controller = PlayerController::new(engine, &config, fullscreen);
    let mut last = controller.snapshot();
    let _ = event_tx.send(PlayerEvent::Status(last.clone()));

    // Once the engine's event stream closes its branch stays disabled so
    // the loop does not spin on a closed channel.
    let mut engine_open = true;

    loop {
        let deadline = controller.hide_deadline();

        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(PlayerCommand::Shutdown) | None => break,
                Some(cmd) => handle_command(&mut controller, cmd, &event_tx),
            },
            evt = engine_rx.recv(), if engine_open => match evt {
                Some(evt) => {
                    log::trace!("Engine event: {:?}", evt);
                    if let Err(e) = controller.apply_engine_event(evt, now()) {
                        let _ = event_tx.send(PlayerEvent::CommandFailed(e));
                    }
                }
                None => {
                    log::warn!("Engine event stream closed");
                    engine_open = false;
                }
            },
            () = sleep_toward(deadline) => controller.on_hide_deadline(now()),
        }

        publish_diff(&mut last, &controller.snapshot(), &event_tx);
    }

    controller.teardown();
    publish_diff(&mut last, &controller.snapshot(), &event_tx);
    log::info!("Controller runtime stopped");
}

fn handle_command<E: MediaEngine>(
    controller: &mut PlayerController<E>,
    cmd: PlayerCommand,
    event_tx: &mpsc::UnboundedSender<PlayerEvent>,
) {
    log::trace!("Command: {:?}", cmd);

    let result = match cmd {
        PlayerCommand::TogglePlay => controller.toggle_play(now()),
        PlayerCommand::ToggleMute => controller.toggle_mute(),
        PlayerCommand::SetVolume { volume } => controller.set_volume(volume),
        PlayerCommand::SeekTo { fraction } => controller.seek_to(fraction),
        PlayerCommand::SeekToPointer { pointer_x, region } => {
            controller.seek_to_pointer(pointer_x, region)
        }
        PlayerCommand::Skip { delta_seconds } => controller.skip(delta_seconds),
        PlayerCommand::SetPlaybackRate { rate } => controller.set_playback_rate(rate),
        PlayerCommand::ToggleFullscreen => controller.toggle_fullscreen(),
        PlayerCommand::ToggleRateMenu => controller.toggle_rate_menu(),
        PlayerCommand::PointerActivity => {
            controller.pointer_activity(now());
            Ok(())
        }
        PlayerCommand::Query => {
            let _ = event_tx.send(PlayerEvent::Status(controller.snapshot()));
            Ok(())
        }
        // Handled by the loop before dispatch.
        PlayerCommand::Shutdown => Ok(()),
    };

    if let Err(e) = result {
        log::debug!("Command refused: {}", e);
        let _ = event_tx.send(PlayerEvent::CommandFailed(e));
    }
}

/// Publish granular change events for every field that differs from the
/// previously published snapshot.
fn publish_diff(
    last: &mut PlayerSnapshot,
    current: &PlayerSnapshot,
    event_tx: &mpsc::UnboundedSender<PlayerEvent>,
) {
    if current.state != last.state {
        let _ = event_tx.send(PlayerEvent::StateChanged(current.state));
    }
    if current.duration != last.duration {
        if let Some(duration) = current.duration {
            let _ = event_tx.send(PlayerEvent::DurationChanged(duration));
        }
    }
    if current.current_time != last.current_time
        || current.progress_percent != last.progress_percent
    {
        let _ = event_tx.send(PlayerEvent::PositionChanged {
            position: current.current_time,
            progress_percent: current.progress_percent,
        });
    }
    if current.volume != last.volume || current.muted != last.muted {
        let _ = event_tx.send(PlayerEvent::VolumeChanged {
            volume: current.volume,
            muted: current.muted,
        });
    }
    if current.playback_rate != last.playback_rate {
        let _ = event_tx.send(PlayerEvent::RateChanged(current.playback_rate));
    }
    if current.controls_visible != last.controls_visible {
        let _ = event_tx.send(PlayerEvent::VisibilityChanged(current.controls_visible));
    }
    if current.rate_menu_open != last.rate_menu_open {
        let _ = event_tx.send(PlayerEvent::RateMenuChanged(current.rate_menu_open));
    }
    if current.is_fullscreen != last.is_fullscreen {
        let _ = event_tx.send(PlayerEvent::FullscreenChanged(current.is_fullscreen));
    }

    *last = current.clone();
}

/// Current instant, taken through the tokio clock so tests that pause time
/// see coherent deadlines.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_toward(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        }
        None => std::future::pending().await,
    }
}
