//! Spreadsheet column letters <-> 0-based column indices.

/// Number of columns in a worksheet (`A` through `XFD`).
pub const MAX_COLUMNS: usize = 16_384;

/// Converts column letters to a 0-based index (`A` -> 0, `Z` -> 25, `AA` -> 26).
///
/// The letters are read as a base-26 numeral whose digits `A..=Z` stand for
/// `1..=26`, most significant first. Lower-case letters are accepted.
/// Returns `None` for an empty string, a non-letter, or a column past `XFD`.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let number = letters.chars().try_fold(0usize, |acc, ch| {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })?;
    (number <= MAX_COLUMNS).then(|| number - 1)
}

/// Converts a 0-based column index back to its letters.
pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Column index of a cell reference, ignoring its row digits (`B17` -> 1).
///
/// Returns `None` when the reference has no column letters or names a
/// column past `XFD`.
pub fn column_of_reference(reference: &str) -> Option<usize> {
    let letters: String = reference.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    column_index(&letters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_columns() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("B"), Some(1));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("AZ"), Some(51));
        assert_eq!(column_index("BA"), Some(52));
        assert_eq!(column_index("XFD"), Some(16_383));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(column_index("aa"), Some(26));
        assert_eq!(column_index("bA"), Some(52));
    }

    #[test]
    fn test_out_of_range_columns() {
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("XFE"), None);
        assert_eq!(column_index("ZZZZZZZ"), None);
        assert_eq!(column_index("AAAAAAAAAAAAAAA"), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_round_trip_one_and_two_letters() {
        for index in 0..(26 + 26 * 26) {
            let letters = column_letters(index);
            assert!(letters.len() <= 2, "{index} -> {letters}");
            assert_eq!(column_index(&letters), Some(index), "{letters}");
        }
        assert_eq!(column_letters(51), "AZ");
        assert_eq!(column_letters(701), "ZZ");
    }

    #[test]
    fn test_cell_reference() {
        assert_eq!(column_of_reference("A1"), Some(0));
        assert_eq!(column_of_reference("B17"), Some(1));
        assert_eq!(column_of_reference("AA1048576"), Some(26));
        assert_eq!(column_of_reference("12"), None);
        assert_eq!(column_of_reference("AAAAAAAAAAAAAAA3"), None);
    }
}
