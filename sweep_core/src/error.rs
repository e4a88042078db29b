use thiserror::Error;

/// Typed faults of the removal station. The `Display` text of a fault is
/// what the status page shows as the current error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SweepError {
    #[error("scale did not signal data-ready before the timeout")]
    DeviceNotReady,
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("printer fetch failed: {0}")]
    PrinterFetch(String),
    #[error("Print not collected, check printer")]
    RemovalNotConfirmed { gain: i64, threshold: i32 },
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("network join failed: {0}")]
    Network(String),
}

impl SweepError {
    /// Faults raised by the scale or the arm. These abort the current tick.
    pub const fn is_device_fault(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotReady | Self::InvalidConfiguration(_) | Self::Hardware(_)
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing printer status source")]
    MissingPrinter,
    #[error("missing arm")]
    MissingArm,
    #[error("missing scale")]
    MissingScale,
    #[error("missing network link")]
    MissingNetwork,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
