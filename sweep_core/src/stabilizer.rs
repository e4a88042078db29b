/// Pick the majority-consistent value from a burst of tared readings.
///
/// Every non-zero reading `v` is a candidate; its score is the number of
/// readings `w` (zeros included) with `|v - w| / (|v| / 100) <= deviation_pct`.
/// The highest score wins and ties go to the candidate that appears last.
/// Returns 0 when every reading is zero or the burst is empty.
pub fn stabilize(values: &[i32], deviation_pct: f64) -> i32 {
    let mut best: Option<(usize, i32)> = None;
    for &v in values.iter().filter(|&&v| v != 0) {
        let unit = f64::from(v).abs() / 100.0;
        let score = values
            .iter()
            .filter(|&&w| {
                let diff = (i64::from(v) - i64::from(w)).unsigned_abs() as f64;
                diff / unit <= deviation_pct
            })
            .count();
        match best {
            Some((top, _)) if top > score => {}
            _ => best = Some((score, v)),
        }
    }
    best.map_or(0, |(_, v)| v)
}
