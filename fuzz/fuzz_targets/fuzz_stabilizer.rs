#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<i32>, u8)| {
    let (values, pct) = input;
    let deviation = f64::from(pct.max(1));
    let v = sweep_core::stabilize(&values, deviation);
    assert!(v == 0 || values.contains(&v));
});
