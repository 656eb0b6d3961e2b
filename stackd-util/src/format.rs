use crate::{Notification, sanitizer};

/// Build the text shown for a notification from a format string.
///
/// Placeholders: `%a` app name, `%s` summary, `%b` body, `%i` icon,
/// `%p` progress (`[ 42%]`, empty without progress) and `%%` for a literal
/// percent sign. Unknown placeholders are kept verbatim.
///
/// With `allow_markup` the result is pango markup restricted to b/i/u,
/// otherwise every tag is stripped.
pub fn render_text(format: &str, n: &Notification, allow_markup: bool) -> String {
    let mut out = String::with_capacity(format.len() + n.summary.len() + n.body.len());
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('a') => out.push_str(&n.app_name),
            Some('s') => out.push_str(&n.summary),
            Some('b') => out.push_str(&n.body),
            Some('i') => out.push_str(&n.app_icon),
            Some('p') => {
                if let Some(progress) = n.progress() {
                    out.push_str(&format!("[{progress:>3}%]"));
                }
            }
            Some('%') => out.push('%'),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }

    let resolved = if allow_markup {
        sanitizer::to_pango_markup(&out)
    } else {
        sanitizer::strip_markup(&out)
    };

    resolved.trim().to_string()
}
