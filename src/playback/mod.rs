pub mod controller;
pub mod engine;
pub mod events;

pub use controller::{SyncController, EDGE_ANCHOR_DELTA_MS};
pub use engine::{EngineHandle, EngineInput, SyncEngine};
pub use events::{
    ControlError, MediaEngine, MediaEvent, Notification, OverlayId, UiCommand, ANCHOR_OVERLAY,
};
