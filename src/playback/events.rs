//! Event surface between the controller and its external collaborators.
//!
//! Media engines report in with [`MediaEvent`], the UI shell commands with
//! [`UiCommand`], and the controller answers with [`Notification`] values
//! plus calls on the per-stream [`MediaEngine`] trait. The controller never
//! talks to a decoder or a widget directly.

use crate::core::stream::StreamIndex;
use crate::core::time::TimeMs;

/// On-screen overlay slot identifier, passed through to the media engine.
pub type OverlayId = u32;

/// Overlay slot used for anchor drift text.
pub const ANCHOR_OVERLAY: OverlayId = 1;

/// Error type for rejected UI commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// Offset math needs a meaningful fixing for every stream, so transport
    /// commands are refused until every stream has a loaded source.
    #[error("not ready: every stream must have a loaded source")]
    NotReady,
    #[error("unknown stream index {0}")]
    UnknownStream(StreamIndex),
    #[error("no anchor is set")]
    AnchorNotSet,
}

/// Asynchronous report from one stream's media engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    /// The engine opened a source for this stream.
    SourceLoaded { stream: StreamIndex },
    /// The engine learned the source's duration.
    DurationKnown { stream: StreamIndex, duration_ms: TimeMs },
    /// The engine started or stopped advancing.
    PlayStateChanged { stream: StreamIndex, playing: bool },
    /// Periodic position report; also confirms seeks.
    PositionChanged { stream: StreamIndex, position_ms: TimeMs },
}

/// Command from the UI shell (or a remote control channel).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiCommand {
    /// Move the shared transport; every stream seeks to
    /// `time_ms + its offset`.
    SeekGlobal(TimeMs),
    /// Pin one stream's current instant to `time_ms` and recalibrate all
    /// offsets around it.
    SeekStream { stream: StreamIndex, time_ms: TimeMs },
    PlayToggle,
    /// `true` arms an anchor at every stream's current position, `false`
    /// clears it everywhere.
    SetAnchor(bool),
    /// Seek every stream back to its anchor and recalibrate from there.
    ReturnToAnchor,
    SetSpeed(f64),
}

/// Outbound notification the UI shell subscribes to.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The shared transport position moved.
    GlobalPositionChanged(TimeMs),
    /// The shared transport range changed (shortest stream duration).
    GlobalRangeChanged(TimeMs),
    /// One stream's displayed position should update.
    StreamPositionChanged { stream: StreamIndex, position_ms: TimeMs },
    /// Transport controls became usable or unusable.
    ControlsEnabledChanged(bool),
    /// An overlay's text changed; `None` means cleared.
    OverlayChanged {
        stream: StreamIndex,
        overlay: OverlayId,
        text: Option<String>,
    },
    /// A command failed its precondition and was not executed.
    CommandRejected(ControlError),
}

/// Command surface of one stream's media engine.
///
/// Seeks are fire-and-forget: the only acknowledgment is a later
/// [`MediaEvent::PositionChanged`]. Implementations live outside this
/// crate (an mpv wrapper, a test fake, ...).
pub trait MediaEngine: Send {
    /// Seek to an absolute position in this stream's own timeline.
    fn seek(&mut self, target_ms: TimeMs);
    fn pause(&mut self);
    fn resume(&mut self);
    /// Playback speed as a factor of real time (1.0 = normal).
    fn set_speed(&mut self, factor: f64);
    fn set_overlay(&mut self, overlay: OverlayId, text: &str);
    fn clear_overlay(&mut self, overlay: OverlayId);
}
