//! Object selection for the skip-object picker.
//!
//! This module provides the interactive half of the picker:
//! - **registry**: per-session object records and the single toggle path
//! - **hit_test**: pointer coordinates to object identity
//! - **controller**: session state machine tying loading, input, rendering
//!   and commit together

pub mod controller;
pub mod hit_test;
pub mod registry;

pub use controller::{
    CommitRequest, LoadTicket, PickerAction, PickerState, SelectionController, SubmitTicket,
};
pub use hit_test::{locate, resolve, ViewTransform};
pub use registry::{Manifest, ObjectRecord, ObjectRegistry};
