//! Partial masking of string values.

/// Character written over the hidden portion of a masked value.
pub const MASK_CHAR: char = '*';

/// Obscure the middle third of a value, keeping its edges readable.
///
/// Works on Unicode code points, so multi-byte characters are never split.
/// With `k = ceil(len / 3)`, code points `[k, 2k)` are replaced by `k`
/// mask characters. Values of length 0 or 1 are returned unchanged.
///
/// # Examples
///
/// ```
/// use veil::redact::mask;
///
/// assert_eq!(mask("123"), "1*3");
/// assert_eq!(mask("77903909029"), "7790****029");
/// ```
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    if len <= 1 {
        return value.to_string();
    }

    let k = len.div_ceil(3);
    let start = k.min(len);
    let end = (2 * k).min(len);

    let mut masked = String::with_capacity(value.len());
    masked.extend(&chars[..start]);
    masked.extend(std::iter::repeat(MASK_CHAR).take(k));
    masked.extend(&chars[end..]);
    masked
}
