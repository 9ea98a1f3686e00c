use fizzquirk_core::theme::{clean_title, Theme};

struct CleanCase {
    raw: &'static str,
    expect: Option<&'static str>,
}

#[test]
fn test_clean_title_table() {
    let cases = [
        CleanCase {
            raw: "the art of minimalism",
            expect: Some("The Art Of Minimalism"),
        },
        CleanCase {
            raw: "  Why   do cats PURR?  ",
            expect: Some("Why Do Cats Purr"),
        },
        CleanCase {
            raw: "**Bold Claim**",
            expect: Some("Bold Claim"),
        },
        CleanCase {
            raw: "self-healing concrete",
            expect: Some("Self-healing Concrete"),
        },
        CleanCase {
            raw: "???",
            expect: None,
        },
        CleanCase {
            raw: "   ",
            expect: None,
        },
    ];

    for case in cases {
        assert_eq!(
            clean_title(case.raw).as_deref(),
            case.expect,
            "clean_title({:?})",
            case.raw
        );
    }
}

#[test]
fn test_dedup_key_ignores_case_and_outer_whitespace() {
    let a = Theme::new("Roman Concrete");
    let b = Theme::new("  roman concrete ");
    assert_eq!(
        a.dedup_key(),
        b.dedup_key(),
        "Identity must be case- and whitespace-insensitive"
    );
}

#[test]
fn test_narration_text_prefers_the_description() {
    let theme = Theme::with_description("Roman Concrete", "It heals its own cracks.");
    assert_eq!(theme.narration_text(), "It heals its own cracks.");
}

#[test]
fn test_narration_text_derives_a_phrase_without_description() {
    let theme = Theme::new("Roman Concrete");
    assert_eq!(
        theme.narration_text(),
        "Did you know about Roman Concrete? Let's dive into some fascinating facts!"
    );
}

#[test]
fn test_narration_text_treats_blank_description_as_absent() {
    let theme = Theme::with_description("Roman Concrete", "   ");
    assert!(
        theme.narration_text().starts_with("Did you know about"),
        "A whitespace-only description should fall back to the derived phrase"
    );
}

#[test]
fn test_slug_is_filesystem_safe() {
    let theme = Theme::new("Why Do Cats Purr");
    assert_eq!(theme.slug(), "Why_Do_Cats_Purr");

    let awkward = Theme::new("It's 100% true: really!");
    let slug = awkward.slug();
    assert!(
        slug.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
        "Slug should only contain safe characters, got {slug}"
    );
}

#[test]
fn test_theme_serialization_omits_absent_description() {
    let bare = serde_json::to_string(&Theme::new("Roman Concrete")).unwrap();
    assert_eq!(bare, r#"{"title":"Roman Concrete"}"#);

    let full = serde_json::to_string(&Theme::with_description("A", "B")).unwrap();
    assert_eq!(full, r#"{"title":"A","description":"B"}"#);
}
