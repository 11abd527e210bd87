//! Session state: the full stream set plus global transport flags.
//!
//! Offsets are only meaningful relative to a single calibration instant, so
//! every operation that touches fixings or offsets works over the whole
//! collection at once. Nothing here talks to media engines or the UI; this
//! is the value the controller mutates inside its serialization boundary.

use crate::core::stream::{StreamIndex, StreamRecord};
use crate::core::time::TimeMs;

/// Process-wide playback session over a fixed set of streams.
#[derive(Debug, Clone)]
pub struct Session {
    streams: Vec<StreamRecord>,
    is_playing: bool,
    fixings_valid: bool,
    anchors_active: bool,
}

impl Session {
    /// Create a session over `count` streams. `count` must be at least 2;
    /// the set is fixed for the session's lifetime.
    pub fn new(count: usize) -> Self {
        assert!(count >= 2, "a session needs at least two streams");
        Self {
            streams: (0..count).map(StreamRecord::new).collect(),
            is_playing: false,
            // No calibration has happened yet, so the zero-valued fixings
            // must not be trusted until the first deliberate seek.
            fixings_valid: false,
            anchors_active: false,
        }
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn stream(&self, index: StreamIndex) -> Option<&StreamRecord> {
        self.streams.get(index)
    }

    pub fn stream_mut(&mut self, index: StreamIndex) -> Option<&mut StreamRecord> {
        self.streams.get_mut(index)
    }

    pub fn streams(&self) -> &[StreamRecord] {
        &self.streams
    }

    pub fn streams_mut(&mut self) -> &mut [StreamRecord] {
        &mut self.streams
    }

    /// True iff playback was started and not yet globally stopped.
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    /// False once any stream has run freely since the last calibration;
    /// the next per-stream seek must re-snapshot ground truth first.
    pub fn fixings_valid(&self) -> bool {
        self.fixings_valid
    }

    pub fn set_fixings_valid(&mut self, valid: bool) {
        self.fixings_valid = valid;
    }

    pub fn anchors_active(&self) -> bool {
        self.anchors_active
    }

    pub fn set_anchors_active(&mut self, active: bool) {
        self.anchors_active = active;
    }

    pub fn all_loaded(&self) -> bool {
        self.streams.iter().all(|s| s.is_loaded())
    }

    pub fn any_playing(&self) -> bool {
        self.streams.iter().any(|s| s.is_playing())
    }

    /// Capture "where everything actually is right now": every stream's
    /// fixing becomes its last reported position.
    pub fn snapshot_fixings(&mut self) {
        for s in &mut self.streams {
            let pos = s.position_ms();
            s.set_fixing(pos);
        }
    }

    /// Recompute every offset from the current fixings and return the
    /// minimum fixing (the new global position).
    ///
    /// The stream with the smallest fixing ends up with offset 0, so
    /// `min(offset_ms) == 0` holds afterwards.
    pub fn lock_offsets(&mut self) -> TimeMs {
        let min_fixing = self
            .streams
            .iter()
            .map(|s| s.fixing_ms())
            .min()
            .unwrap_or(0);
        for s in &mut self.streams {
            let offset = s.fixing_ms() - min_fixing;
            s.set_offset(offset);
        }
        min_fixing
    }

    /// Shared transport range: the shortest stream bounds the global
    /// slider. Streams without a known duration count as 0.
    pub fn min_duration(&self) -> TimeMs {
        self.streams
            .iter()
            .map(|s| s.duration_ms().unwrap_or(0))
            .min()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn test_single_stream_session_rejected() {
        Session::new(1);
    }

    #[test]
    fn test_lock_offsets_min_is_zero() {
        let mut session = Session::new(3);
        session.stream_mut(0).unwrap().set_fixing(12_000);
        session.stream_mut(1).unwrap().set_fixing(9_000);
        session.stream_mut(2).unwrap().set_fixing(15_000);

        let min_fixing = session.lock_offsets();
        assert_eq!(min_fixing, 9_000);
        assert_eq!(session.stream(0).unwrap().offset_ms(), 3_000);
        assert_eq!(session.stream(1).unwrap().offset_ms(), 0);
        assert_eq!(session.stream(2).unwrap().offset_ms(), 6_000);

        let min_offset = session.streams().iter().map(|s| s.offset_ms()).min();
        assert_eq!(min_offset, Some(0));
    }

    #[test]
    fn test_snapshot_fixings_uses_reported_positions() {
        let mut session = Session::new(2);
        session.stream_mut(0).unwrap().report_position(10_000);
        session.stream_mut(1).unwrap().report_position(9_000);
        session.snapshot_fixings();
        assert_eq!(session.stream(0).unwrap().fixing_ms(), 10_000);
        assert_eq!(session.stream(1).unwrap().fixing_ms(), 9_000);
    }

    #[test]
    fn test_min_duration_unknown_counts_as_zero() {
        let mut session = Session::new(2);
        session.stream_mut(0).unwrap().report_duration(120_000);
        assert_eq!(session.min_duration(), 0);
        session.stream_mut(1).unwrap().report_duration(90_000);
        assert_eq!(session.min_duration(), 90_000);
    }

    #[test]
    fn test_all_loaded_and_any_playing() {
        let mut session = Session::new(2);
        assert!(!session.all_loaded());
        session.stream_mut(0).unwrap().mark_loaded();
        assert!(!session.all_loaded());
        session.stream_mut(1).unwrap().mark_loaded();
        assert!(session.all_loaded());

        assert!(!session.any_playing());
        session.stream_mut(1).unwrap().set_playing(true);
        assert!(session.any_playing());
    }
}
