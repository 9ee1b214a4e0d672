/*!
 * Tests for language utility functions
 */

use syncsub::language_utils::{
    get_language_name, language_codes_match, normalize_to_part1_or_part2t, normalize_to_part2t,
    validate_language_code,
};

#[test]
fn test_validate_withCommonCodes_shouldAccept() {
    for code in ["en", "ml", "fr", "eng", "mal", "fra", "fre", "GER"] {
        assert!(validate_language_code(code).is_ok(), "rejected {}", code);
    }
}

#[test]
fn test_validate_withGarbage_shouldReject() {
    for code in ["", "x", "zz", "english", "e1"] {
        assert!(validate_language_code(code).is_err(), "accepted {}", code);
    }
}

#[test]
fn test_normalize_shouldMapBibliographicCodes() {
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("de").unwrap(), "deu");
    assert_eq!(normalize_to_part1_or_part2t("ger").unwrap(), "de");
    assert_eq!(normalize_to_part1_or_part2t("mal").unwrap(), "ml");
}

#[test]
fn test_codesMatch_acrossCodeForms() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("fre", "fr"));
    assert!(!language_codes_match("en", "ml"));
    assert!(!language_codes_match("en", "zz"));
}

#[test]
fn test_languageName_shouldBeEnglishName() {
    assert_eq!(get_language_name("ml").unwrap(), "Malayalam");
    assert_eq!(get_language_name("deu").unwrap(), "German");
    assert!(get_language_name("qq").is_err());
}
