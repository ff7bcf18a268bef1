//! `Content-Disposition` for downloads carrying arbitrary user file names.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 5987 `attr-char` set: everything but alphanumerics and `!#$&+-.^_`|~` is escaped.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Plain-ASCII stand-in for clients that ignore `filename*`.
fn ascii_fallback(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    if fallback.trim_matches('_').is_empty() {
        "download".to_string()
    } else {
        fallback
    }
}

/// `attachment; filename="<ascii>"; filename*=UTF-8''<percent-encoded>`
pub fn attachment(filename: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback(filename),
        utf8_percent_encode(filename, ATTR_CHAR)
    )
}
