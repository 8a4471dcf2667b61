// tests/pattern_props.rs
use proptest::prelude::*;
use pipeshell::glob::SegmentPattern;

// Segment names without wildcards or separators.
fn name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9._+()\\[\\]{}^$|-]{1,16}"
}

proptest! {
    #[test]
    fn literal_segment_matches_only_itself(name in name_strategy(), other in name_strategy()) {
        let pat = SegmentPattern::new(&name).unwrap();
        prop_assert!(pat.is_match(&name));
        prop_assert_eq!(pat.is_match(&other), name == other);
    }

    #[test]
    fn star_matches_any_name(name in name_strategy()) {
        let pat = SegmentPattern::new("*").unwrap();
        prop_assert!(pat.is_match(&name));
    }

    #[test]
    fn question_marks_match_exact_length(name in name_strategy(), n in 1usize..20) {
        let pat = SegmentPattern::new(&"?".repeat(n)).unwrap();
        prop_assert_eq!(pat.is_match(&name), name.chars().count() == n);
    }

    #[test]
    fn prefix_star_matches_every_extension(stem in name_strategy(), ext in name_strategy()) {
        let pat = SegmentPattern::new(&format!("{stem}*")).unwrap();
        let with_ext = format!("{stem}.{ext}");
        prop_assert!(pat.is_match(&with_ext));
        prop_assert!(pat.is_match(&stem));
    }
}

#[test]
fn matching_is_case_sensitive() {
    let pat = SegmentPattern::new("File?.TXT").unwrap();
    assert!(pat.is_match("File1.TXT"));
    assert!(!pat.is_match("file1.txt"));
}

#[test]
fn regex_metacharacters_are_literal() {
    let pat = SegmentPattern::new("a.b*").unwrap();
    assert!(pat.is_match("a.bcd"));
    assert!(!pat.is_match("axbcd"));
}
