//! ISO-639-1 language codes.

use crate::error::CoreError;

/// All two-letter ISO-639-1 codes, sorted.
pub const ISO_639_1_CODES: &[&str] = &[
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg", "bh",
    "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv", "cy", "da",
    "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi", "fj", "fo", "fr",
    "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr", "ht", "hu", "hy", "hz",
    "ia", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja", "jv", "ka", "kg", "ki", "kj",
    "kk", "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw", "ky", "la", "lb", "lg", "li", "ln",
    "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml", "mn", "mr", "ms", "mt", "my", "na", "nb",
    "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv", "ny", "oc", "oj", "om", "or", "os", "pa", "pi",
    "pl", "ps", "pt", "qu", "rm", "rn", "ro", "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk",
    "sl", "sm", "sn", "so", "sq", "sr", "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti",
    "tk", "tl", "tn", "to", "tr", "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo",
    "wa", "wo", "xh", "yi", "yo", "za", "zh", "zu",
];

/// True if `code` is a lowercase ISO-639-1 code.
pub fn is_valid_iso_639_1(code: &str) -> bool {
    ISO_639_1_CODES.binary_search(&code).is_ok()
}

/// Validate a language code, returning it unchanged.
pub fn validate_iso_639_1(code: &str) -> Result<&str, CoreError> {
    if is_valid_iso_639_1(code) {
        Ok(code)
    } else {
        Err(CoreError::InvalidLanguage(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        assert!(ISO_639_1_CODES.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ISO_639_1_CODES.len(), 184);
    }

    #[test]
    fn test_validation() {
        assert!(is_valid_iso_639_1("en"));
        assert!(is_valid_iso_639_1("zu"));
        assert!(!is_valid_iso_639_1("EN"));
        assert!(!is_valid_iso_639_1("eng"));
        assert!(!is_valid_iso_639_1("xx"));
        assert!(matches!(
            validate_iso_639_1(""),
            Err(CoreError::InvalidLanguage(_))
        ));
    }
}
