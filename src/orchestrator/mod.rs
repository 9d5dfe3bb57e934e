//! Application-level orchestration.
//!
//! This module owns the polling loop, the start/stop command flow and the configuration
//! import/export exchanges. UI/CLI layers talk to it over channels only: they send
//! [`UiCommand`](crate::model::UiCommand)s and render the
//! [`ControllerEvent`](crate::model::ControllerEvent)s it emits.

mod controller;
mod transfer;

pub(crate) use controller::run_controller;
