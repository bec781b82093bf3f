//! Small utility helpers used across modules.

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge response bodies. Cuts on a char boundary.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

/// Whole-number percentage of `part / total`, 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> u8 {
  if total == 0 {
    return 0;
  }
  ((part as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}
