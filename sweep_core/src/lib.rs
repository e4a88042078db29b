#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Print-removal logic (hardware-agnostic).
//!
//! All hardware and network interactions go through the `sweep_traits`
//! seams: `Scale`, `Arm`, `PrinterStatus`, `NetworkLink` and `Clock`.
//!
//! ## Architecture
//!
//! - **Stabilizer**: majority-consistent reduction of a reading burst (`stabilizer`)
//! - **Scale**: tare-aware wrapper over a raw scale (`scale`)
//! - **Controller**: Connecting → Idle → Printing → Removing state machine (`controller`)
//! - **Status**: immutable snapshot published after each tick, HTML rendering (`status`)
//! - **Runner**: tick loop with graceful shutdown (`runner`)

pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod network;
pub mod runner;
pub mod scale;
pub mod stabilizer;
pub mod status;

pub use builder::ControllerBuilder;
pub use controller::{ControllerContext, ControllerState, Fault, RemovalController};
pub use error::{BuildError, Result, SweepError};
pub use stabilizer::stabilize;
pub use status::{StatusHandle, StatusView, render_html};
