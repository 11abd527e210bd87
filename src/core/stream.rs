//! Per-stream playback state.

use crate::core::time::TimeMs;

/// Stable identity of a stream within the session (load order, 0-based).
/// Stream 0 is the reference stream for global-position derivation.
pub type StreamIndex = usize;

/// Mutable state for one loaded video stream.
///
/// Positions and durations are whatever the stream's media engine last
/// reported; the engine is trusted not to report negative values. Offset
/// and fixing are only meaningful after a calibration pass over the whole
/// session, and the fixing is stale between calibrations.
#[derive(Debug, Clone)]
pub struct StreamRecord {
    index: StreamIndex,
    loaded: bool,
    duration_ms: Option<TimeMs>,
    position_ms: TimeMs,
    offset_ms: TimeMs,
    fixing_ms: TimeMs,
    anchor_ms: Option<TimeMs>,
    playing: bool,
}

impl StreamRecord {
    pub fn new(index: StreamIndex) -> Self {
        Self {
            index,
            loaded: false,
            duration_ms: None,
            position_ms: 0,
            offset_ms: 0,
            fixing_ms: 0,
            anchor_ms: None,
            playing: false,
        }
    }

    pub fn index(&self) -> StreamIndex {
        self.index
    }

    /// True once the media engine has opened a source for this stream.
    /// Reports arriving before that are stale input and get dropped.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub fn duration_ms(&self) -> Option<TimeMs> {
        self.duration_ms
    }

    pub fn report_duration(&mut self, ms: TimeMs) {
        self.duration_ms = Some(ms);
    }

    /// Last position reported by the media engine. Monotonic only while
    /// playing; jumps on seek.
    pub fn position_ms(&self) -> TimeMs {
        self.position_ms
    }

    pub fn report_position(&mut self, ms: TimeMs) {
        self.position_ms = ms;
    }

    /// Signed correction such that this stream's timeline position equals
    /// `global_position + offset_ms`.
    pub fn offset_ms(&self) -> TimeMs {
        self.offset_ms
    }

    pub fn set_offset(&mut self, ms: TimeMs) {
        self.offset_ms = ms;
    }

    /// The position this stream was last deliberately pinned to. Basis for
    /// offset recalculation, stale in between.
    pub fn fixing_ms(&self) -> TimeMs {
        self.fixing_ms
    }

    pub fn set_fixing(&mut self, ms: TimeMs) {
        self.fixing_ms = ms;
    }

    /// Present only while a session-wide anchor is armed.
    pub fn anchor_ms(&self) -> Option<TimeMs> {
        self.anchor_ms
    }

    /// Pin the anchor to the current position.
    pub fn arm_anchor(&mut self) {
        self.anchor_ms = Some(self.position_ms);
    }

    pub fn clear_anchor(&mut self) {
        self.anchor_ms = None;
    }

    /// Last play state reported by the media engine. Kept so play-state
    /// transitions can be edge-triggered: a report is only acted on when
    /// this boolean actually flips.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stream_is_blank() {
        let s = StreamRecord::new(3);
        assert_eq!(s.index(), 3);
        assert!(!s.is_loaded());
        assert_eq!(s.duration_ms(), None);
        assert_eq!(s.position_ms(), 0);
        assert_eq!(s.offset_ms(), 0);
        assert_eq!(s.fixing_ms(), 0);
        assert_eq!(s.anchor_ms(), None);
        assert!(!s.is_playing());
    }

    #[test]
    fn test_arm_anchor_captures_position() {
        let mut s = StreamRecord::new(0);
        s.report_position(1234);
        s.arm_anchor();
        assert_eq!(s.anchor_ms(), Some(1234));
        s.report_position(2000);
        // Anchor stays where it was armed.
        assert_eq!(s.anchor_ms(), Some(1234));
        s.clear_anchor();
        assert_eq!(s.anchor_ms(), None);
    }
}
