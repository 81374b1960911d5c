//! Outbound notifications for finished pipeline runs.
//!
//! - [`TerminalNotifier`] - the seam the pipeline engine calls exactly
//!   once per run.
//! - [`CallbackNotifier`] - single-attempt, form-encoded HTTP callback.

pub mod delivery;

pub use delivery::callback::{
    CallbackError, CallbackNotifier, FailurePayload, SuccessPayload, TerminalNotifier,
};
