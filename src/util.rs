//! Small utility helpers used across modules.

/// Lowercase-and-dash a display name into an asset path segment.
/// "Ayrton Senna" -> "ayrton-senna", "McLaren MP4/4" -> "mclaren-mp4-4".
pub fn slugify(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  let mut pending_dash = false;
  for ch in name.chars() {
    if ch.is_ascii_alphanumeric() {
      if pending_dash && !out.is_empty() {
        out.push('-');
      }
      out.push(ch.to_ascii_lowercase());
      pending_dash = false;
    } else {
      pending_dash = true;
    }
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
/// The cut is clamped to a char boundary; multi-byte text never splits.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slugs_are_lowercase_dashed_ascii() {
    assert_eq!(slugify("Ayrton Senna"), "ayrton-senna");
    assert_eq!(slugify("McLaren MP4/4"), "mclaren-mp4-4");
    assert_eq!(slugify("  Tyrrell  P34 "), "tyrrell-p34");
    assert_eq!(slugify("Brawn BGP 001"), "brawn-bgp-001");
  }

  #[test]
  fn truncation_is_safe_for_multibyte_text() {
    // 100 x '€' is 300 bytes; byte 200 falls inside the 67th char.
    let body = "€".repeat(100);
    let out = trunc_for_log(&body, 200);
    assert!(out.starts_with(&"€".repeat(66)));
    assert!(out.ends_with("(300 bytes total)"));
    assert_eq!(trunc_for_log("short", 200), "short");
  }
}
