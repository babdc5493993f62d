use paneview_parsers::claude_code::segment;
use paneview_parsers::normalize;
use proptest::prelude::*;

fn screen_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("❯ ".to_string()),
        Just("⏺ ".to_string()),
        Just("  ⎿  ".to_string()),
        Just("│ ".to_string()),
        Just(" │".to_string()),
        Just("────".to_string()),
        Just("\x1b[1;32m".to_string()),
        Just("\x1b]0;title\x07".to_string()),
        Just("\x1b(B".to_string()),
        Just("\r\n".to_string()),
        Just("\n".to_string()),
        Just("\n\n\n".to_string()),
        Just("\t".to_string()),
        "[a-z ]{0,12}",
        any::<char>().prop_map(|c| c.to_string()),
    ]
}

fn screen() -> impl Strategy<Value = String> {
    prop::collection::vec(screen_fragment(), 0..40).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in screen()) {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalized_text_has_no_blank_edges(raw in screen()) {
        let text = normalize(&raw);
        prop_assert!(!text.starts_with('\n'));
        prop_assert!(!text.ends_with('\n'));
        prop_assert!(!text.contains('\x1b'));
    }

    #[test]
    fn segment_never_emits_empty_turns(raw in screen()) {
        for turn in segment(&normalize(&raw)) {
            prop_assert!(turn.has_content());
        }
    }
}
