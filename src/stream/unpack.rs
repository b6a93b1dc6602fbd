//! Dean Edwards p.a.c.k.e.r. unpacking.
//!
//! Packed scripts look like
//!
//! ```text
//! eval(function(p,a,c,k,e,d){...}('0 1=2',62,3,'var|x|5'.split('|'),0,{}))
//! ```
//!
//! where every base-`a` word token in the payload `p` indexes into the
//! dictionary `k`. Unpacking substitutes the tokens back without running
//! any JavaScript.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static PACKED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)eval\(function\(p,\s*a,\s*c,\s*k,\s*e,\s*[dr]\).*?\}\s*\(\s*'(?P<payload>(?:[^'\\]|\\.)*)'\s*,\s*(?P<radix>\d+)\s*,\s*(?P<count>\d+)\s*,\s*'(?P<words>(?:[^'\\]|\\.)*)'\.split\('\|'\)"#,
    )
    .expect("packer pattern is valid")
});

/// JavaScript word characters, matching `\b\w+\b` in the packer's own
/// replace loop.
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9A-Za-z_]+").expect("word pattern is valid"));

const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Returns `true` if `script` contains a packed block.
pub fn is_packed(script: &str) -> bool {
    PACKED_RE.is_match(script)
}

/// Unpack the first packed block in `script`.
///
/// `None` when there is no packed block or its radix is unsupported.
pub fn unpack(script: &str) -> Option<String> {
    let caps = PACKED_RE.captures(script)?;
    let radix: usize = caps["radix"].parse().ok()?;
    if !(2..=DIGITS.len()).contains(&radix) {
        return None;
    }
    let count: usize = caps["count"].parse().ok()?;

    let payload = unescape(&caps["payload"]);
    let words_raw = unescape(&caps["words"]);
    let words: Vec<&str> = words_raw.split('|').collect();

    let unpacked = WORD_RE.replace_all(&payload, |token: &Captures| {
        let token = &token[0];
        decode_token(token, radix)
            .filter(|&index| index < count)
            .and_then(|index| words.get(index))
            .filter(|word| !word.is_empty())
            .map_or_else(|| token.to_string(), |word| (*word).to_string())
    });
    Some(unpacked.into_owned())
}

/// Parse `token` as the packer's base-`radix` number. Tokens with leading
/// zeros never come out of `Number.toString(radix)` and are left alone.
fn decode_token(token: &str, radix: usize) -> Option<usize> {
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    token.bytes().try_fold(0usize, |acc, byte| {
        let digit = DIGITS.iter().position(|&d| d == byte)?;
        if digit >= radix {
            return None;
        }
        acc.checked_mul(radix)?.checked_add(digit)
    })
}

/// Undo JavaScript single-quoted string escapes relevant to packed output.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
