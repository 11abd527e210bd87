//! The offset-calibration and synchronized-seek state machine.
//!
//! The controller owns the [`Session`] and one [`MediaEngine`] handle per
//! stream. Media engines report in asynchronously; the UI shell issues
//! commands; both funnel through [`SyncController::process_event`] and
//! [`SyncController::process_command`], which must only ever run inside a
//! single serialization boundary (see [`crate::playback::engine`]). No
//! method blocks or performs I/O, so that boundary stays short.

use crossbeam::channel::Sender;
use tracing::{debug, warn};

use crate::core::session::Session;
use crate::core::stream::StreamIndex;
use crate::core::time::{format_compact, Sign, TimeMs};
use crate::playback::events::{
    ControlError, MediaEngine, MediaEvent, Notification, UiCommand, ANCHOR_OVERLAY,
};

/// Drift below this threshold is not shown against the reference stream;
/// it is roughly one frame at 30fps and not meaningfully actionable.
pub const EDGE_ANCHOR_DELTA_MS: TimeMs = 30;

/// Controller over N synchronized streams.
pub struct SyncController {
    session: Session,
    engines: Vec<Box<dyn MediaEngine>>,
    notifications: Sender<Notification>,
    controls_enabled: bool,
}

impl SyncController {
    /// Create a controller over one media engine per stream. The stream
    /// count is fixed here for the whole session; at least two engines are
    /// required.
    pub fn new(engines: Vec<Box<dyn MediaEngine>>, notifications: Sender<Notification>) -> Self {
        Self {
            session: Session::new(engines.len()),
            engines,
            notifications,
            controls_enabled: false,
        }
    }

    /// Read-only view of the session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn notify(&self, notification: Notification) {
        // The receiver side may already be gone during shutdown.
        let _ = self.notifications.send(notification);
    }

    /// Transport controls are usable once every stream has a source and
    /// nothing is running freely. Published only on change.
    fn refresh_controls_enabled(&mut self) {
        let enabled = self.session.all_loaded() && !self.session.any_playing();
        if enabled != self.controls_enabled {
            self.controls_enabled = enabled;
            self.notify(Notification::ControlsEnabledChanged(enabled));
        }
    }

    /// Apply one asynchronous media engine report.
    ///
    /// Stale input (an index outside the session, or a report for a stream
    /// with no loaded source) is dropped silently; nothing here is fatal.
    pub fn process_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::SourceLoaded { stream } => {
                let Some(rec) = self.session.stream_mut(stream) else {
                    debug!(stream, "dropping source-loaded report for unknown stream");
                    return;
                };
                rec.mark_loaded();
                self.refresh_controls_enabled();
            }
            MediaEvent::DurationKnown { stream, duration_ms } => {
                let Some(rec) = self.session.stream_mut(stream) else {
                    debug!(stream, "dropping duration report for unknown stream");
                    return;
                };
                if !rec.is_loaded() {
                    debug!(stream, "dropping duration report before source load");
                    return;
                }
                rec.report_duration(duration_ms);
                debug!(stream, duration_ms, "duration known");
                self.notify(Notification::GlobalRangeChanged(self.session.min_duration()));
            }
            MediaEvent::PlayStateChanged { stream, playing } => {
                self.on_play_state_changed(stream, playing);
            }
            MediaEvent::PositionChanged { stream, position_ms } => {
                self.on_position_changed(stream, position_ms);
            }
        }
    }

    fn on_play_state_changed(&mut self, stream: StreamIndex, playing: bool) {
        let was_stopped = !self.session.any_playing();
        let Some(rec) = self.session.stream_mut(stream) else {
            debug!(stream, "dropping play-state report for unknown stream");
            return;
        };
        // Edge-triggered: only act when the state actually flips, so the
        // pause fan-out below cannot recurse through its own reports.
        if rec.is_playing() == playing {
            return;
        }
        rec.set_playing(playing);
        debug!(stream, playing, "stream play state changed");

        if playing {
            if was_stopped {
                // Positions diverge from here on; the captured fixings are
                // stale until the next deliberate seek re-snapshots them.
                self.session.set_fixings_valid(false);
                debug!("playback started, fixings invalidated");
            }
        } else {
            // One stream halting halts the whole set; a lone stream must
            // never keep running ahead of paused partners.
            self.stop_all();
        }
        self.refresh_controls_enabled();
    }

    fn on_position_changed(&mut self, stream: StreamIndex, position_ms: TimeMs) {
        let Some(rec) = self.session.stream_mut(stream) else {
            debug!(stream, "dropping position report for unknown stream");
            return;
        };
        if !rec.is_loaded() {
            debug!(stream, "dropping position report before source load");
            return;
        }
        rec.report_position(position_ms);
        self.notify(Notification::StreamPositionChanged { stream, position_ms });

        if self.session.anchors_active() {
            self.update_anchor_overlay(stream);
        }

        // Only the reference stream drives the shared position, and only
        // while playing; a stale report from a paused stream must not move
        // the transport.
        if stream == 0 && self.session.is_playing() {
            if let Some(reference) = self.session.stream(0) {
                self.notify(Notification::GlobalPositionChanged(
                    position_ms - reference.offset_ms(),
                ));
            }
        }
    }

    /// Execute one UI command. Commands that fail their precondition are
    /// rejected without any partial state change.
    pub fn process_command(&mut self, command: UiCommand) -> Result<(), ControlError> {
        match command {
            UiCommand::SeekGlobal(time_ms) => self.seek_global(time_ms),
            UiCommand::SeekStream { stream, time_ms } => self.seek_stream(stream, time_ms),
            UiCommand::PlayToggle => self.play_toggle(),
            UiCommand::SetAnchor(true) => self.set_anchor(),
            UiCommand::SetAnchor(false) => self.clear_anchor(),
            UiCommand::ReturnToAnchor => self.return_to_anchor(),
            UiCommand::SetSpeed(factor) => self.set_speed(factor),
        }
    }

    fn ensure_ready(&self) -> Result<(), ControlError> {
        if self.session.all_loaded() {
            Ok(())
        } else {
            Err(ControlError::NotReady)
        }
    }

    /// Pin `stream`'s current instant to `time_ms` and re-derive every
    /// offset from the resulting fixings. This is the calibration
    /// primitive behind both the per-stream seek and return-to-anchor.
    fn fix_after_seek(&mut self, stream: StreamIndex, time_ms: TimeMs) {
        if !self.session.fixings_valid() {
            // Capture where everything actually is before applying the
            // user's deliberate correction.
            self.session.snapshot_fixings();
            let fixings: Vec<TimeMs> =
                self.session.streams().iter().map(|s| s.fixing_ms()).collect();
            debug!(?fixings, "snapshotted fixings from reported positions");
        }
        if let Some(rec) = self.session.stream_mut(stream) {
            rec.set_fixing(time_ms);
        }
        let min_fixing = self.session.lock_offsets();
        self.session.set_fixings_valid(true);
        self.notify(Notification::GlobalPositionChanged(min_fixing));
    }

    fn seek_stream(&mut self, stream: StreamIndex, time_ms: TimeMs) -> Result<(), ControlError> {
        self.ensure_ready()?;
        if stream >= self.session.stream_count() {
            return Err(ControlError::UnknownStream(stream));
        }
        self.fix_after_seek(stream, time_ms);
        self.engines[stream].seek(time_ms);
        if let Some(rec) = self.session.stream_mut(stream) {
            rec.report_position(time_ms);
        }
        self.notify(Notification::StreamPositionChanged { stream, position_ms: time_ms });
        Ok(())
    }

    fn seek_global(&mut self, time_ms: TimeMs) -> Result<(), ControlError> {
        self.ensure_ready()?;
        // Fire-and-forget seeks; the engines' position reports are the
        // acknowledgment. Fixings and offsets are untouched, the display
        // update is optimistic.
        for stream in 0..self.session.stream_count() {
            let target = match self.session.stream(stream) {
                Some(rec) => time_ms + rec.offset_ms(),
                None => continue,
            };
            self.engines[stream].seek(target);
            self.notify(Notification::StreamPositionChanged { stream, position_ms: target });
        }
        Ok(())
    }

    fn play_toggle(&mut self) -> Result<(), ControlError> {
        self.ensure_ready()?;
        if self.session.is_playing() {
            self.stop_all();
        } else {
            debug!("starting playback on all streams");
            self.session.set_playing(true);
            for engine in &mut self.engines {
                engine.resume();
            }
        }
        Ok(())
    }

    fn stop_all(&mut self) {
        debug!("stopping playback on all streams");
        self.session.set_playing(false);
        for engine in &mut self.engines {
            engine.pause();
        }
    }

    fn set_anchor(&mut self) -> Result<(), ControlError> {
        self.ensure_ready()?;
        for rec in self.session.streams_mut() {
            rec.arm_anchor();
        }
        self.session.set_anchors_active(true);
        let anchors: Vec<Option<TimeMs>> =
            self.session.streams().iter().map(|s| s.anchor_ms()).collect();
        debug!(?anchors, "anchor set");
        for stream in 0..self.session.stream_count() {
            self.update_anchor_overlay(stream);
        }
        Ok(())
    }

    fn clear_anchor(&mut self) -> Result<(), ControlError> {
        self.ensure_ready()?;
        for rec in self.session.streams_mut() {
            rec.clear_anchor();
        }
        self.session.set_anchors_active(false);
        debug!("anchor cleared");
        for stream in 0..self.session.stream_count() {
            self.engines[stream].clear_overlay(ANCHOR_OVERLAY);
            self.notify(Notification::OverlayChanged {
                stream,
                overlay: ANCHOR_OVERLAY,
                text: None,
            });
        }
        Ok(())
    }

    fn return_to_anchor(&mut self) -> Result<(), ControlError> {
        self.ensure_ready()?;
        if !self.session.anchors_active() {
            return Err(ControlError::AnchorNotSet);
        }
        for stream in 0..self.session.stream_count() {
            let Some(anchor) = self.session.stream(stream).and_then(|s| s.anchor_ms()) else {
                continue;
            };
            self.engines[stream].seek(anchor);
            if let Some(rec) = self.session.stream_mut(stream) {
                rec.report_position(anchor);
            }
            self.notify(Notification::StreamPositionChanged { stream, position_ms: anchor });
            self.update_anchor_overlay(stream);
            // Re-derive offsets from the restored anchor positions instead
            // of leaving them at their pre-return values.
            self.fix_after_seek(stream, anchor);
        }
        Ok(())
    }

    fn set_speed(&mut self, factor: f64) -> Result<(), ControlError> {
        self.ensure_ready()?;
        debug!(factor, "setting playback speed");
        for engine in &mut self.engines {
            engine.set_speed(factor);
        }
        Ok(())
    }

    /// Recompute and publish one stream's drift overlay.
    ///
    /// The text shows how far the stream moved from its own anchor and,
    /// for non-reference streams drifting more than
    /// [`EDGE_ANCHOR_DELTA_MS`] against the reference, how far it moved
    /// relative to the reference stream.
    fn update_anchor_overlay(&mut self, stream: StreamIndex) {
        let Some(rec) = self.session.stream(stream) else {
            return;
        };
        let Some(anchor) = rec.anchor_ms() else {
            return;
        };
        let delta = rec.position_ms() - anchor;
        let mut text = format_compact(delta, Sign::Always);
        if stream != 0 {
            if let Some(reference) = self.session.stream(0) {
                if let Some(reference_anchor) = reference.anchor_ms() {
                    let delta_to_reference =
                        delta - (reference.position_ms() - reference_anchor);
                    if delta_to_reference.abs() > EDGE_ANCHOR_DELTA_MS {
                        text.push_str(&format!(
                            " ({})",
                            format_compact(delta_to_reference, Sign::Always)
                        ));
                    }
                }
            }
        }
        self.engines[stream].set_overlay(ANCHOR_OVERLAY, &text);
        self.notify(Notification::OverlayChanged {
            stream,
            overlay: ANCHOR_OVERLAY,
            text: Some(text),
        });
    }

    /// Log and surface a rejected command. Used by the event loop so a
    /// precondition failure still produces a user-visible indication.
    pub(crate) fn reject(&self, error: ControlError) {
        warn!(%error, "command rejected");
        self.notify(Notification::CommandRejected(error));
    }
}
