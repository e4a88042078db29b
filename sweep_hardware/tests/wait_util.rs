use std::cell::Cell;
use std::time::Duration;

use sweep_hardware::error::HwError;
use sweep_hardware::util::wait_until_low_with_timeout;
use sweep_traits::MonotonicClock;
use sweep_traits::clock::test_clock::TestClock;

#[test]
fn wait_until_low_success_path() {
    let clock = TestClock::new();
    let polls = Cell::new(0u32);

    // Line drops after the third probe.
    let res = wait_until_low_with_timeout(
        || {
            polls.set(polls.get() + 1);
            Ok(polls.get() <= 3)
        },
        Duration::from_millis(50),
        Duration::from_micros(200),
        &clock,
    );
    assert!(res.is_ok(), "expected success, got {res:?}");
    assert_eq!(polls.get(), 4);
    assert_eq!(clock.sleeps(), vec![Duration::from_micros(200); 3]);
}

#[test]
fn wait_until_low_timeout_path() {
    let clock = TestClock::new();
    let err = wait_until_low_with_timeout(|| Ok(true), Duration::from_secs(5), Duration::from_millis(100), &clock)
        .expect_err("expected timeout error");

    match err {
        HwError::DeviceNotReady => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(clock.elapsed(), Duration::from_secs(5));
}

#[test]
fn wait_until_low_real_clock_gives_up() {
    let started = std::time::Instant::now();
    let err = wait_until_low_with_timeout(|| Ok(true), Duration::from_millis(5), Duration::from_micros(200), &MonotonicClock::new())
        .expect_err("expected timeout error");
    assert!(matches!(err, HwError::DeviceNotReady));
    assert!(started.elapsed() >= Duration::from_millis(5));
}

#[test]
fn pin_read_errors_end_the_wait() {
    let clock = TestClock::new();
    let err = wait_until_low_with_timeout(
        || Err(HwError::Gpio("pin vanished".into())),
        Duration::from_secs(1),
        Duration::from_millis(1),
        &clock,
    )
    .unwrap_err();
    assert!(matches!(err, HwError::Gpio(_)));
    assert!(clock.sleeps().is_empty());
}
