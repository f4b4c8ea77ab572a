//! A1-style column labels

/// Highest column index a worksheet may address (`XFD`)
pub const MAX_COLUMN: u32 = 16_384;

/// 1-based column index to its letter label (1 → `A`, 27 → `AA`)
///
/// Index 0 has no label and yields an empty string.
pub fn index_to_letters(index: u32) -> String {
    let mut remaining = index;
    let mut label = Vec::new();
    while remaining > 0 {
        let digit = (remaining - 1) % 26;
        label.push(b'A' + digit as u8);
        remaining = (remaining - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

/// Column index from the leading letters of a label or cell reference
///
/// Only the leading run of `A`-`Z` is consumed, so `"C12"` gives 3.
/// A reference with no leading letter gives 0.
pub fn letters_to_index(reference: &str) -> u32 {
    reference
        .bytes()
        .take_while(u8::is_ascii_uppercase)
        .fold(0u32, |acc, b| {
            acc.saturating_mul(26).saturating_add(u32::from(b - b'A') + 1)
        })
}

/// Cell reference such as `B7` from 1-based row and column
pub fn cell_ref(row: u32, column: u32) -> String {
    format!("{}{}", index_to_letters(column), row)
}
