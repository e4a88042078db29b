use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("pwm error: {0}")]
    Pwm(String),
    #[error("hx711 data-ready timeout")]
    DeviceNotReady,
    #[error("invalid hx711 channel code {0} (expected 1 = A/128, 3 = A/64, 2 = B/32)")]
    InvalidConfiguration(u8),
    #[error("servo angle {0} out of range 0..=180")]
    InvalidAngle(u16),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;

pub(crate) fn gpio<E: core::fmt::Debug>(e: E) -> HwError {
    HwError::Gpio(format!("{e:?}"))
}
