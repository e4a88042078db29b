//! Hobby servo driven by a 50 Hz PWM channel.

use std::time::Duration;

use embedded_hal::pwm::SetDutyCycle;
use sweep_traits::{Arm, Clock};
use tracing::debug;

use crate::error::{HwError, Result};

/// Duty cycles are expressed on a 10-bit scale.
pub const DUTY_RESOLUTION: u16 = 1023;
/// Duty at 0°.
pub const MIN_DUTY: u16 = 40;
/// Duty at 180°.
pub const MAX_DUTY: u16 = 115;
pub const MAX_ANGLE: u16 = 180;

pub const DEFAULT_STEP_DEG: u16 = 1;
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(20);

/// Linear map 0..=180° onto MIN_DUTY..=MAX_DUTY, truncating.
pub fn duty_for_angle(angle: u16) -> u16 {
    let span = f64::from(MAX_DUTY - MIN_DUTY);
    let frac = f64::from(angle) / f64::from(MAX_ANGLE);
    (f64::from(MIN_DUTY) + span * frac) as u16
}

/// Every angle visited by a sweep: from `start` toward `end` in `step`
/// increments. The last angle is always `end`.
pub fn sweep_angles(start: u16, end: u16, step: u16) -> Vec<u16> {
    let step = usize::from(step.max(1));
    let mut angles: Vec<u16> = if start <= end {
        (start..=end).step_by(step).collect()
    } else {
        (end..=start).rev().step_by(step).collect()
    };
    if angles.last() != Some(&end) {
        angles.push(end);
    }
    angles
}

pub struct Servo<P, C> {
    pwm: P,
    clock: C,
    step_deg: u16,
    step_delay: Duration,
    position: Option<u16>,
}

impl<P, C> Servo<P, C>
where
    P: SetDutyCycle,
    C: Clock,
{
    pub fn new(pwm: P, clock: C) -> Self {
        Self {
            pwm,
            clock,
            step_deg: DEFAULT_STEP_DEG,
            step_delay: DEFAULT_STEP_DELAY,
            position: None,
        }
    }

    pub fn with_step(mut self, step_deg: u16, step_delay: Duration) -> Self {
        self.step_deg = step_deg.max(1);
        self.step_delay = step_delay;
        self
    }

    /// Last commanded angle, `None` before the first move.
    pub fn position(&self) -> Option<u16> {
        self.position
    }

    /// Command a single angle immediately.
    pub fn set_angle(&mut self, angle: u16) -> Result<()> {
        if angle > MAX_ANGLE {
            return Err(HwError::InvalidAngle(angle));
        }
        self.pwm
            .set_duty_cycle_fraction(duty_for_angle(angle), DUTY_RESOLUTION)
            .map_err(|e| HwError::Pwm(format!("{e:?}")))?;
        self.position = Some(angle);
        Ok(())
    }

    /// Step from `start` to `end`, pausing `step_delay` after every step.
    pub fn sweep(&mut self, start: u16, end: u16) -> Result<()> {
        for angle in [start, end] {
            if angle > MAX_ANGLE {
                return Err(HwError::InvalidAngle(angle));
            }
        }
        debug!(start, end, "servo sweep");
        for angle in sweep_angles(start, end, self.step_deg) {
            self.set_angle(angle)?;
            self.clock.sleep(self.step_delay);
        }
        Ok(())
    }
}

impl<P, C> Arm for Servo<P, C>
where
    P: SetDutyCycle,
    C: Clock,
{
    fn sweep(&mut self, start_deg: u16, end_deg: u16) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Servo::sweep(self, start_deg, end_deg)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use rstest::rstest;
    use sweep_traits::clock::test_clock::TestClock;

    #[derive(Default)]
    struct RecordingPwm {
        duties: Vec<u16>,
    }

    impl embedded_hal::pwm::ErrorType for RecordingPwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for RecordingPwm {
        fn max_duty_cycle(&self) -> u16 {
            DUTY_RESOLUTION
        }

        fn set_duty_cycle(&mut self, duty: u16) -> core::result::Result<(), Infallible> {
            self.duties.push(duty);
            Ok(())
        }
    }

    #[rstest]
    #[case(0, MIN_DUTY)]
    #[case(180, MAX_DUTY)]
    #[case(90, 77)]
    #[case(140, 98)]
    fn duty_mapping(#[case] angle: u16, #[case] duty: u16) {
        assert_eq!(duty_for_angle(angle), duty);
    }

    #[test]
    fn duty_is_monotonic() {
        let duties: Vec<u16> = (0..=180).map(duty_for_angle).collect();
        assert!(duties.windows(2).all(|w| w[0] <= w[1]));
    }

    #[rstest]
    #[case(0, 4, 1, vec![0, 1, 2, 3, 4])]
    #[case(4, 0, 1, vec![4, 3, 2, 1, 0])]
    #[case(0, 10, 4, vec![0, 4, 8, 10])]
    #[case(10, 0, 4, vec![10, 6, 2, 0])]
    #[case(0, 8, 4, vec![0, 4, 8])]
    #[case(7, 7, 1, vec![7])]
    fn angles_visited(#[case] start: u16, #[case] end: u16, #[case] step: u16, #[case] expected: Vec<u16>) {
        assert_eq!(sweep_angles(start, end, step), expected);
    }

    #[test]
    fn sweep_commands_each_step_and_paces() {
        let clock = TestClock::new();
        let mut servo = Servo::new(RecordingPwm::default(), clock.clone())
            .with_step(1, Duration::from_millis(10));
        servo.sweep(140, 0).unwrap();
        assert_eq!(servo.pwm.duties.len(), 141);
        assert_eq!(servo.pwm.duties.first(), Some(&duty_for_angle(140)));
        assert_eq!(servo.pwm.duties.last(), Some(&MIN_DUTY));
        assert_eq!(servo.position(), Some(0));
        assert_eq!(clock.elapsed(), Duration::from_millis(1410));
    }

    #[test]
    fn coarse_step_still_reaches_arm_down() {
        let mut servo = Servo::new(RecordingPwm::default(), TestClock::new())
            .with_step(3, Duration::ZERO);
        servo.sweep(140, 0).unwrap();
        // 140, 137, .., 2, then 0
        assert_eq!(servo.pwm.duties.len(), 48);
        assert_eq!(servo.pwm.duties.last(), Some(&MIN_DUTY));
        assert_eq!(servo.position(), Some(0));
    }

    #[test]
    fn rejects_out_of_range_angles_before_moving() {
        let mut servo = Servo::new(RecordingPwm::default(), TestClock::new());
        assert!(matches!(servo.sweep(0, 181), Err(HwError::InvalidAngle(181))));
        assert!(servo.pwm.duties.is_empty());
        assert_eq!(servo.position(), None);
    }
}
