/// Escape a string for use inside a CSS selector (CSSOM `CSS.escape`).
///
/// The output is valid both as an identifier (`#id`) and inside a quoted
/// attribute value.
pub fn css_escape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => push_hex(&mut out, c),
            '0'..='9' if i == 0 || (i == 1 && chars[0] == '-') => push_hex(&mut out, c),
            '-' if i == 0 && chars.len() == 1 => out.push_str("\\-"),
            c if (c as u32) >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() => {
                out.push(c)
            }
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }

    out
}

fn push_hex(out: &mut String, c: char) {
    out.push_str(&format!("\\{:x} ", c as u32));
}
