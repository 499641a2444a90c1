/// Niceness of the lowest scheduling priority.
pub const NICE_LOWEST: i32 = 20;
/// Niceness of the highest scheduling priority.
pub const NICE_HIGHEST: i32 = -20;

/// Maps a 0-100 priority percentage to an OS niceness value.
///
/// 0% is the lowest priority (+20), 100% the highest (-20). Out-of-range
/// input is clamped; no priority at all maps to the normal niceness of 0.
pub fn nice_value(percent: Option<f64>) -> i32 {
    let Some(percent) = percent else {
        return 0;
    };
    let percent = if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    };
    let span = f64::from(NICE_LOWEST - NICE_HIGHEST);
    (f64::from(NICE_LOWEST) - percent / 100.0 * span).round() as i32
}
