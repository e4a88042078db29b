//! Bit-banged driver for the HX711 24-bit load-cell ADC.
//!
//! The chip signals a finished conversion by pulling DOUT low. Each read
//! clocks 24 data bits MSB first on the rising edge of PD_SCK, followed by
//! 1..=3 extra pulses that select input and gain for the *next* conversion.
//! Holding PD_SCK high for more than 60 µs powers the chip down.

use std::fmt;
use std::time::Duration;

use embedded_hal::digital::{InputPin, OutputPin};
use sweep_traits::{Clock, Scale};
use tracing::{debug, trace};

use crate::error::{HwError, Result, gpio};
use crate::util::wait_until_low_with_timeout;

pub const DATA_BITS: u32 = 24;
pub const READY_TIMEOUT: Duration = Duration::from_secs(5);
/// PD_SCK high time used to enter power-down.
pub const POWER_DOWN_HOLD: Duration = Duration::from_micros(80);

const READY_POLL: Duration = Duration::from_micros(200);
const SIGN_BIT: u32 = 1 << (DATA_BITS - 1);
const DATA_MASK: u32 = (1 << DATA_BITS) - 1;

/// Input channel and PGA gain selected for the next conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    #[default]
    A128,
    A64,
    B32,
}

impl Channel {
    /// Extra PD_SCK pulses after the 24 data bits.
    pub const fn pulses(self) -> u8 {
        match self {
            Channel::A128 => 1,
            Channel::B32 => 2,
            Channel::A64 => 3,
        }
    }

    pub const fn gain(self) -> u8 {
        match self {
            Channel::A128 => 128,
            Channel::A64 => 64,
            Channel::B32 => 32,
        }
    }

    pub const fn input(self) -> char {
        match self {
            Channel::A128 | Channel::A64 => 'A',
            Channel::B32 => 'B',
        }
    }
}

impl TryFrom<u8> for Channel {
    type Error = HwError;

    /// Accepts the pulse-count codes 1 (A/128), 3 (A/64) and 2 (B/32).
    fn try_from(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Channel::A128),
            3 => Ok(Channel::A64),
            2 => Ok(Channel::B32),
            other => Err(HwError::InvalidConfiguration(other)),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel {} gain {}", self.input(), self.gain())
    }
}

/// Interpret a 24-bit two's-complement word as a signed count.
/// Bits above bit 23 are ignored.
pub fn decode_twos_complement(raw: u32) -> i32 {
    let raw = raw & DATA_MASK;
    if raw & SIGN_BIT != 0 {
        raw as i32 - (1 << DATA_BITS)
    } else {
        raw as i32
    }
}

/// Inverse of [`decode_twos_complement`] for values in the 24-bit range.
pub fn encode_twos_complement(value: i32) -> u32 {
    (value as u32) & DATA_MASK
}

pub struct Hx711<DT, SCK, C> {
    dt: DT,
    sck: SCK,
    clock: C,
    channel: Channel,
    ready_timeout: Duration,
}

impl<DT, SCK, C> Hx711<DT, SCK, C>
where
    DT: InputPin,
    SCK: OutputPin,
    C: Clock,
{
    /// Take ownership of the pins and drive PD_SCK low (chip awake).
    /// The channel defaults to A/128, which is also the chip's power-on
    /// selection, so no configuration pulses are issued here.
    pub fn new(dt: DT, mut sck: SCK, clock: C) -> Result<Self> {
        sck.set_low().map_err(gpio)?;
        Ok(Self {
            dt,
            sck,
            clock,
            channel: Channel::default(),
            ready_timeout: READY_TIMEOUT,
        })
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// True when DOUT is low, i.e. a conversion is waiting. Never blocks.
    pub fn is_ready(&mut self) -> Result<bool> {
        self.dt.is_low().map_err(gpio)
    }

    /// Poll DOUT until it goes low or `timeout` passes.
    pub fn await_ready(&mut self, timeout: Duration) -> Result<()> {
        let Self { dt, clock, .. } = self;
        wait_until_low_with_timeout(|| dt.is_high().map_err(gpio), timeout, READY_POLL, clock)
    }

    /// Select input/gain. The selection only takes effect after a full
    /// conversion has been clocked out, so one conversion is discarded.
    pub fn set_channel(&mut self, channel: Channel) -> Result<()> {
        self.channel = channel;
        self.await_ready(self.ready_timeout)?;
        for _ in 0..DATA_BITS {
            self.pulse()?;
        }
        self.select_channel()?;
        debug!(%channel, "hx711 channel selected");
        Ok(())
    }

    /// [`Hx711::set_channel`] from a pulse-count code (1, 3 or 2).
    pub fn set_channel_code(&mut self, code: u8) -> Result<()> {
        let channel = Channel::try_from(code)?;
        self.set_channel(channel)
    }

    /// Clock out one conversion as the unsigned 24-bit word.
    pub fn read_raw(&mut self) -> Result<u32> {
        self.read_raw_within(self.ready_timeout)
    }

    /// One conversion. `raw = true` returns the undecoded 24-bit pattern,
    /// otherwise the signed count.
    pub fn read(&mut self, raw: bool) -> Result<i32> {
        let word = self.read_raw()?;
        if raw {
            Ok(word as i32)
        } else {
            Ok(decode_twos_complement(word))
        }
    }

    /// Hold PD_SCK high long enough to enter power-down.
    pub fn power_off(&mut self) -> Result<()> {
        self.sck.set_low().map_err(gpio)?;
        self.sck.set_high().map_err(gpio)?;
        self.clock.sleep(POWER_DOWN_HOLD);
        Ok(())
    }

    /// Wake the chip and re-apply the current channel, since it comes back
    /// at A/128.
    pub fn power_on(&mut self) -> Result<()> {
        self.sck.set_low().map_err(gpio)?;
        self.set_channel(self.channel)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.power_off()?;
        self.power_on()
    }

    fn read_raw_within(&mut self, timeout: Duration) -> Result<u32> {
        self.await_ready(timeout)?;
        let mut word: u32 = 0;
        for _ in 0..DATA_BITS {
            self.pulse()?;
            let bit = self.dt.is_high().map_err(gpio)?;
            word = (word << 1) | u32::from(bit);
        }
        self.select_channel()?;
        trace!(raw = word, "hx711 raw read");
        Ok(word)
    }

    fn select_channel(&mut self) -> Result<()> {
        for _ in 0..self.channel.pulses() {
            self.pulse()?;
        }
        Ok(())
    }

    #[inline]
    fn pulse(&mut self) -> Result<()> {
        self.sck.set_high().map_err(gpio)?;
        self.sck.set_low().map_err(gpio)
    }
}

impl<DT, SCK, C> Scale for Hx711<DT, SCK, C>
where
    DT: InputPin,
    SCK: OutputPin,
    C: Clock,
{
    fn read(&mut self, timeout: Duration) -> std::result::Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        let word = self.read_raw_within(timeout)?;
        Ok(decode_twos_complement(word))
    }
}
