//! Legacy string-type spellings
//!
//! Code built against the old external/internal string headers mangles its
//! string types with a `_external` / `_internal` suffix. Rewriting those
//! spellings to the canonical class names lets both builds join on the same
//! identifier.

/// (canonical, legacy) class names
const LEGACY_SPELLINGS: &[(&str, &str)] = &[
    ("nsString", "nsString_external"),
    ("nsCString", "nsCString_external"),
    ("nsDependentString", "nsDependentString_external"),
    ("nsDependentCString", "nsDependentCString_external"),
    ("NS_ConvertASCIItoUTF16", "NS_ConvertASCIItoUTF16_external"),
    ("NS_ConvertUTF8toUTF16", "NS_ConvertUTF8toUTF16_external"),
    ("NS_ConvertUTF16toUTF8", "NS_ConvertUTF16toUTF8_external"),
    ("NS_LossyConvertUTF16toASCII", "NS_LossyConvertUTF16toASCII_external"),
    ("nsGetterCopies", "nsGetterCopies_external"),
    ("nsCGetterCopies", "nsCGetterCopies_external"),
    ("nsDependentSubstring", "nsDependentSubstring_external"),
    ("nsDependentCSubstring", "nsDependentCSubstring_external"),
    ("nsAString", "nsAString_internal"),
    ("nsACString", "nsACString_internal"),
];

const MARKERS: &[&str] = &["_external", "_internal"];

/// Rewrite legacy string-type source names inside a mangled name
pub fn canonicalize_mangled(mangled: &str) -> String {
    if !MARKERS.iter().any(|marker| mangled.contains(marker)) {
        return mangled.to_string();
    }

    let mut result = mangled.to_string();
    for (canonical, legacy) in LEGACY_SPELLINGS {
        let pattern = format!("{}{}", legacy.len(), legacy);
        let replacement = format!("{}{}", canonical.len(), canonical);
        result = result.replace(&pattern, &replacement);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_spelling_is_rewritten() {
        assert_eq!(
            canonicalize_mangled("_Z3fooRK17nsString_external"),
            "_Z3fooRK8nsString"
        );
        assert_eq!(
            canonicalize_mangled("_ZN3Foo3BarERK18nsAString_internal"),
            "_ZN3Foo3BarERK9nsAString"
        );
    }

    #[test]
    fn test_canonical_names_are_untouched() {
        for name in ["_Z3fooRK8nsString", "_Z1fi", "_ZN9_internal1fEv"] {
            assert_eq!(canonicalize_mangled(name), name);
            assert_eq!(canonicalize_mangled(&canonicalize_mangled(name)), canonicalize_mangled(name));
        }
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = canonicalize_mangled("_Z3bazRK18nsCString_externalRK17nsString_external");
        assert_eq!(once, "_Z3bazRK9nsCStringRK8nsString");
        assert_eq!(canonicalize_mangled(&once), once);
    }
}
