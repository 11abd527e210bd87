//! Serialized event loop around the controller.
//!
//! Media engines report concurrently and the UI shell commands from its own
//! thread; the controller's state must never see an interleaved update. A
//! single dedicated thread owns the [`SyncController`] and drains one input
//! channel, so "snapshot fixings, mutate one, recompute all offsets" is an
//! indivisible step by construction.

use crossbeam::channel::{self, Receiver, Sender};
use std::thread;
use tracing::debug;

use crate::playback::controller::SyncController;
use crate::playback::events::{MediaEngine, MediaEvent, Notification, UiCommand};

/// One unit of work for the loop thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineInput {
    Media(MediaEvent),
    Ui(UiCommand),
    Shutdown,
}

/// Cheap cloneable producer side of the loop. Media engine adapters and the
/// UI shell each keep one.
#[derive(Clone)]
pub struct EngineHandle {
    input_tx: Sender<EngineInput>,
}

impl EngineHandle {
    /// Forward a media engine report. Fire-and-forget; reports for a
    /// shut-down engine are discarded.
    pub fn report(&self, event: MediaEvent) {
        let _ = self.input_tx.send(EngineInput::Media(event));
    }

    /// Forward a UI command. Rejections come back as
    /// [`Notification::CommandRejected`].
    pub fn command(&self, command: UiCommand) {
        let _ = self.input_tx.send(EngineInput::Ui(command));
    }
}

/// Owner of the loop thread and both channel endpoints.
pub struct SyncEngine {
    input_tx: Sender<EngineInput>,
    notifications_rx: Receiver<Notification>,
    thread: Option<thread::JoinHandle<()>>,
}

impl SyncEngine {
    /// Spawn the loop over one media engine per stream (at least two).
    pub fn spawn(engines: Vec<Box<dyn MediaEngine>>) -> Self {
        let (input_tx, input_rx) = channel::unbounded::<EngineInput>();
        let (notify_tx, notifications_rx) = channel::unbounded();

        let thread = thread::spawn(move || {
            let mut controller = SyncController::new(engines, notify_tx);
            for input in input_rx {
                match input {
                    EngineInput::Media(event) => controller.process_event(event),
                    EngineInput::Ui(command) => {
                        if let Err(error) = controller.process_command(command) {
                            controller.reject(error);
                        }
                    }
                    EngineInput::Shutdown => break,
                }
            }
            debug!("sync engine loop exited");
        });

        Self {
            input_tx,
            notifications_rx,
            thread: Some(thread),
        }
    }

    /// Producer handle for media engine adapters and the UI shell.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            input_tx: self.input_tx.clone(),
        }
    }

    /// Outbound notifications, in the order the loop produced them.
    pub fn notifications(&self) -> &Receiver<Notification> {
        &self.notifications_rx
    }

    /// Stop the loop and wait for it to finish. Also runs on drop.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = self.input_tx.send(EngineInput::Shutdown);
            let _ = handle.join();
        }
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::TimeMs;
    use crate::playback::events::{ControlError, OverlayId};
    use std::time::Duration;

    struct NullEngine;

    impl MediaEngine for NullEngine {
        fn seek(&mut self, _target_ms: TimeMs) {}
        fn pause(&mut self) {}
        fn resume(&mut self) {}
        fn set_speed(&mut self, _factor: f64) {}
        fn set_overlay(&mut self, _overlay: OverlayId, _text: &str) {}
        fn clear_overlay(&mut self, _overlay: OverlayId) {}
    }

    fn spawn_pair() -> SyncEngine {
        SyncEngine::spawn(vec![Box::new(NullEngine), Box::new(NullEngine)])
    }

    fn recv(engine: &SyncEngine) -> Notification {
        engine
            .notifications()
            .recv_timeout(Duration::from_secs(5))
            .expect("notification within timeout")
    }

    #[test]
    fn test_commands_rejected_before_load_surface_as_notifications() {
        let engine = spawn_pair();
        engine.handle().command(UiCommand::SeekGlobal(1_000));
        assert_eq!(
            recv(&engine),
            Notification::CommandRejected(ControlError::NotReady)
        );
        engine.shutdown();
    }

    #[test]
    fn test_inputs_apply_in_arrival_order() {
        let engine = spawn_pair();
        let handle = engine.handle();
        handle.report(MediaEvent::SourceLoaded { stream: 0 });
        handle.report(MediaEvent::SourceLoaded { stream: 1 });
        handle.report(MediaEvent::PositionChanged { stream: 0, position_ms: 10_000 });
        handle.report(MediaEvent::PositionChanged { stream: 1, position_ms: 9_000 });
        handle.command(UiCommand::SeekStream { stream: 0, time_ms: 12_000 });

        assert_eq!(recv(&engine), Notification::ControlsEnabledChanged(true));
        assert_eq!(
            recv(&engine),
            Notification::StreamPositionChanged { stream: 0, position_ms: 10_000 }
        );
        assert_eq!(
            recv(&engine),
            Notification::StreamPositionChanged { stream: 1, position_ms: 9_000 }
        );
        // The calibration publishes the minimum fixing as the new global
        // position, then the optimistic per-stream update.
        assert_eq!(recv(&engine), Notification::GlobalPositionChanged(9_000));
        assert_eq!(
            recv(&engine),
            Notification::StreamPositionChanged { stream: 0, position_ms: 12_000 }
        );
        engine.shutdown();
    }

    #[test]
    fn test_shutdown_joins_loop_thread() {
        let engine = spawn_pair();
        let handle = engine.handle();
        engine.shutdown();
        // Sends to a stopped loop are discarded, not panics.
        handle.report(MediaEvent::SourceLoaded { stream: 0 });
    }
}
