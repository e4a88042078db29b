//! Raspberry Pi wiring via rppal.

use std::time::Duration;

use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use sweep_traits::MonotonicClock;
use tracing::info;

use crate::error::{HwError, Result};
use crate::hx711::{Channel, Hx711};
use crate::servo::{DUTY_RESOLUTION, Servo};

const SERVO_PWM_HZ: f64 = 50.0;

pub type PiHx711 = Hx711<InputPin, OutputPin, MonotonicClock>;
pub type PiServo = Servo<SoftPwm, MonotonicClock>;

/// Open DOUT/PD_SCK, select `channel` and return a ready driver.
pub fn open_hx711(dt_pin: u8, sck_pin: u8, channel: Channel, ready_timeout: Duration) -> Result<PiHx711> {
    let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
    let dt = gpio
        .get(dt_pin)
        .map_err(|e| HwError::Gpio(e.to_string()))?
        .into_input();
    let sck = gpio
        .get(sck_pin)
        .map_err(|e| HwError::Gpio(e.to_string()))?
        .into_output();
    let mut hx = Hx711::new(dt, sck, MonotonicClock::new())?.with_ready_timeout(ready_timeout);
    if channel != hx.channel() {
        hx.set_channel(channel)?;
    }
    info!(dt_pin, sck_pin, %channel, "hx711 opened");
    Ok(hx)
}

pub fn open_servo(pin: u8, step_deg: u16, step_delay: Duration) -> Result<PiServo> {
    let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
    let out = gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(e.to_string()))?
        .into_output();
    info!(pin, "servo opened");
    Ok(Servo::new(SoftPwm::new(out), MonotonicClock::new()).with_step(step_deg, step_delay))
}

/// 50 Hz software PWM on a plain GPIO output.
pub struct SoftPwm {
    pin: OutputPin,
}

impl SoftPwm {
    pub fn new(pin: OutputPin) -> Self {
        Self { pin }
    }
}

#[derive(Debug)]
pub struct SoftPwmError(pub String);

impl embedded_hal::pwm::Error for SoftPwmError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl ErrorType for SoftPwm {
    type Error = SoftPwmError;
}

impl SetDutyCycle for SoftPwm {
    fn max_duty_cycle(&self) -> u16 {
        DUTY_RESOLUTION
    }

    fn set_duty_cycle(&mut self, duty: u16) -> std::result::Result<(), SoftPwmError> {
        let fraction = f64::from(duty.min(DUTY_RESOLUTION)) / f64::from(DUTY_RESOLUTION);
        self.pin
            .set_pwm_frequency(SERVO_PWM_HZ, fraction)
            .map_err(|e| SoftPwmError(e.to_string()))
    }
}
