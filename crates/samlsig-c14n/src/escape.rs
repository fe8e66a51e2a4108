#![forbid(unsafe_code)]

//! Character escaping for canonical output.
//!
//! Text: `&`, `<`, `>` and CR. Attribute values: `&`, `<`, `"`, TAB, LF and
//! CR. Processing-instruction data: CR only.

pub fn write_text(out: &mut Vec<u8>, s: &str) {
    write_escaped(out, s, |ch| match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\r' => Some("&#xD;"),
        _ => None,
    });
}

pub fn write_attr(out: &mut Vec<u8>, s: &str) {
    write_escaped(out, s, |ch| match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#x9;"),
        '\n' => Some("&#xA;"),
        '\r' => Some("&#xD;"),
        _ => None,
    });
}

pub fn write_pi(out: &mut Vec<u8>, s: &str) {
    write_escaped(out, s, |ch| (ch == '\r').then_some("&#xD;"));
}

fn write_escaped(out: &mut Vec<u8>, s: &str, replace: impl Fn(char) -> Option<&'static str>) {
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        if let Some(entity) = replace(ch) {
            out.extend_from_slice(s[start..i].as_bytes());
            out.extend_from_slice(entity.as_bytes());
            start = i + ch.len_utf8();
        }
    }
    out.extend_from_slice(s[start..].as_bytes());
}
