pub fn percent(covered: u32, total: u32) -> f32 {
    if total > 0 {
        let tmp: f64 = ((1000 * 100 * covered as u64) / total as u64) as f64;
        (tmp as f32 / 10_f32).floor() / 100_f32
    } else {
        100.0
    }
}
