use ammonia::Builder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<\s*br\s*/?\s*>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Reduce markup to what pango can render.
///
/// Allowed tags: b, i, u. Line breaks become newlines, every other tag is
/// dropped while its text content is kept. The output is valid pango
/// markup: stray `<`, `>` and `&` are escaped.
pub fn to_pango_markup(text: &str) -> String {
  let with_newlines = LINE_BREAK.replace_all(text, "\n");

  let allowed_tags: HashSet<&str> = ["b", "i", "u"].into_iter().collect();

  Builder::default()
    .tags(allowed_tags)
    .link_rel(None)
    .generic_attributes(HashSet::new())
    .tag_attributes(Default::default())
    .url_schemes(HashSet::new())
    .clean(&with_newlines)
    .to_string()
    .replace("&nbsp;", "\u{a0}")
}

/// Strip all markup tags, returning plain text.
///
/// Line breaks become newlines and HTML entities are decoded.
pub fn strip_markup(text: &str) -> String {
  let with_newlines = LINE_BREAK.replace_all(text, "\n");
  let without_tags = TAG.replace_all(&with_newlines, "");

  decode_entities(&without_tags)
}

/// Decode common HTML entities to their character equivalents
fn decode_entities(text: &str) -> String {
  text
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&quot;", "\"")
    .replace("&apos;", "'")
    .replace("&#39;", "'")
    .replace("&#x27;", "'")
    .replace("&nbsp;", " ")
    .replace("&amp;", "&") // Must be last to avoid double-decoding
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pango_markup_preserves_basic_styles() {
    let input = "<b>bold</b> <i>italic</i> <u>underline</u>";
    assert_eq!(to_pango_markup(input), input);
  }

  #[test]
  fn test_pango_markup_drops_links_but_keeps_text() {
    let output = to_pango_markup(r#"see <a href="https://example.com">here</a>"#);
    assert_eq!(output, "see here");
  }

  #[test]
  fn test_pango_markup_escapes_stray_characters() {
    let output = to_pango_markup("5 < 10 & 7 > 3");
    assert_eq!(output, "5 &lt; 10 &amp; 7 &gt; 3");
  }

  #[test]
  fn test_pango_markup_removes_script_content() {
    let output = to_pango_markup("safe<script>alert('x')</script>");
    assert_eq!(output, "safe");
  }

  #[test]
  fn test_line_breaks_become_newlines() {
    assert_eq!(strip_markup("one<br>two<BR/>three"), "one\ntwo\nthree");
    assert_eq!(to_pango_markup("one<br />two"), "one\ntwo");
  }

  #[test]
  fn test_strip_markup_decodes_entities() {
    assert_eq!(strip_markup("<b>Tom &amp; Jerry</b> &lt;3"), "Tom & Jerry <3");
  }

  #[test]
  fn test_strip_markup_plain_text_untouched() {
    assert_eq!(strip_markup("nothing to see"), "nothing to see");
  }
}
