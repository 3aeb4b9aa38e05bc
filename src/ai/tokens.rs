/// Rough token count for cost reporting.
///
/// CJK characters count as two tokens each, everything else as a quarter
/// token; the sum is rounded up. Not a billing figure.
pub fn estimate_tokens(text: &str) -> u64 {
    let (cjk, other) = text.chars().fold((0u64, 0u64), |(cjk, other), c| {
        if is_cjk(c) {
            (cjk + 1, other)
        } else {
            (cjk, other + 1)
        }
    });
    cjk * 2 + other.div_ceil(4)
}

fn is_cjk(c: char) -> bool {
    matches!(
        c,
        '\u{3000}'..='\u{303f}' // CJK punctuation
            | '\u{3040}'..='\u{309f}' // hiragana
            | '\u{30a0}'..='\u{30ff}' // katakana
            | '\u{ff00}'..='\u{ff9f}' // full/half-width forms
            | '\u{4e00}'..='\u{9faf}' // unified ideographs
    )
}
