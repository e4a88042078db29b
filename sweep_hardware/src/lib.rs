#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]

pub mod error;
pub mod hx711;
pub mod servo;
pub mod sim;
pub mod util;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod rpi;

pub use error::HwError;
pub use hx711::{Channel, Hx711};
pub use servo::Servo;
pub use sim::{SimulatedArm, SimulatedBin, SimulatedScale};
