//! Canonical text forms used when comparing answers and guesses.

/// Canonicalize free text before comparing it against answer banks or secret words.
///
/// Trims, lowercases, folds closing teh (`ة`) to heh (`ه`) and the hamza-carrying
/// alef forms (`أ`, `إ`, `آ`) to bare alef, then collapses whitespace runs.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ة' => 'ه',
            'أ' | 'إ' | 'آ' => 'ا',
            other => other,
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a numeric answer, accepting Arabic-Indic digits alongside ASCII ones.
pub fn parse_number(text: &str) -> Option<f64> {
    let ascii: String = text
        .trim()
        .chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{066B}' => '.',
            '\u{2212}' => '-',
            other => other,
        })
        .collect();

    ascii.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Collapse inner whitespace of a display name after trimming it.
pub fn tidy_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive key used to compare player names.
pub fn name_key(name: &str) -> String {
    tidy_name(name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_closing_teh_and_hamza_forms() {
        assert_eq!(normalize("قطة"), normalize("قطه"));
        assert_eq!(normalize("أسد"), "اسد");
        assert_eq!(normalize("إوزة"), "اوزه");
        assert_eq!(normalize("آ"), "ا");
    }

    #[test]
    fn trims_lowercases_and_collapses_whitespace() {
        assert_eq!(normalize("  Hello   World "), "hello world");
        assert_eq!(normalize("وحيد    القرن"), "وحيد القرن");
    }

    #[test]
    fn parses_ascii_and_arabic_indic_numbers() {
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("٤٢"), Some(42.0));
        assert_eq!(parse_number("3.5"), Some(3.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn name_keys_ignore_case_and_spacing() {
        assert_eq!(name_key(" Alice  Smith "), name_key("alice smith"));
        assert_eq!(tidy_name("  Bob   Jones "), "Bob Jones");
    }
}
