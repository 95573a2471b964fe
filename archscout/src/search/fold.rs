//! Byte-level ASCII case folding.
//!
//! Folding goes through a 256-entry substitution table instead of a text-aware lowercase
//! routine. The substitution is one byte for one byte, so a folded line has exactly the offsets
//! of the raw line. Multi-byte (non-ASCII) letters are left untouched and therefore only match
//! case-sensitively.

/// Maps every byte to itself except `A..=Z`, which map to `a..=z`.
pub static LOWER_TABLE: [u8; 256] = build_lower_table();

const fn build_lower_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        table[i] = if b >= b'A' && b <= b'Z' { b + (b'a' - b'A') } else { b };
        i += 1;
    }
    table
}

/// Replaces the contents of `dst` with the folded bytes of `src`.
///
/// `dst` keeps its allocation between calls.
pub fn fold_into(dst: &mut Vec<u8>, src: &[u8]) {
    dst.clear();
    dst.extend(src.iter().map(|&b| LOWER_TABLE[b as usize]));
}

/// Lowercases a pattern expression for matching against folded input.
///
/// The character following a backslash is kept as written so escapes like `\S`, `\W`, `\B` or
/// `\A` do not change meaning.
pub fn fold_pattern(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut escaped = false;
    for c in expr.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else {
            if c == '\\' {
                escaped = true;
            }
            out.push(c.to_ascii_lowercase());
        }
    }
    out
}
