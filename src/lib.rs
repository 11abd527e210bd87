//! Offset-calibration and synchronized-seek engine for playing several
//! independently loaded video streams in a user-controlled relative
//! alignment.
//!
//! Decoding, rendering, and presentation are external: each stream's media
//! backend implements [`playback::MediaEngine`], reports in with
//! [`playback::MediaEvent`], and the UI shell drives
//! [`playback::UiCommand`] and consumes [`playback::Notification`] values.
//! The [`playback::SyncEngine`] loop serializes all of it into one
//! state-mutation boundary.

pub mod core;
pub mod playback;

pub use crate::core::{Session, Sign, StreamIndex, StreamRecord, TimeMs};
pub use crate::playback::{
    ControlError, EngineHandle, MediaEngine, MediaEvent, Notification, SyncController, SyncEngine,
    UiCommand,
};
