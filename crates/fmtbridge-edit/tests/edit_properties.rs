// Property-based tests for edit computation
// Identical input yields no edit; a single changed span is reconstructed
// exactly by the minimal edit.

use fmtbridge_edit::{
    full_replacement, minimal_replacement, EditComputer, EditMode, EditResult, TextDocument,
};
use proptest::prelude::*;
use url::Url;

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-z ]{0,6}",
            Just("\n".to_string()),
            Just(";".to_string()),
            Just("é".to_string()),
            Just("日本".to_string()),
            Just("🦀".to_string()),
        ],
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

fn document(text: &str) -> TextDocument {
    TextDocument::new(
        Url::parse("file:///ws/src/index.ts").unwrap(),
        "typescript",
        text,
    )
}

// Identical text never produces an edit, in either mode
proptest! {
    #[test]
    fn prop_identical_text_is_noop(text in arb_text()) {
        prop_assert!(minimal_replacement(&text, &text).is_none());
        prop_assert!(full_replacement(&text, &text).is_none());

        let doc = document(&text);
        prop_assert_eq!(EditComputer.compute(&doc, &text, EditMode::Minimal), EditResult::NoOp);
        prop_assert!(EditComputer.compute(&doc, &text, EditMode::FullDocument).into_edits().is_empty());
    }
}

// Changing one contiguous middle span is undone exactly by the minimal edit
proptest! {
    #[test]
    fn prop_minimal_edit_reconstructs_formatted(
        prefix in arb_text(),
        middle in arb_text(),
        replacement in arb_text(),
        suffix in arb_text(),
    ) {
        let original = format!("{}{}{}", prefix, middle, suffix);
        let formatted = format!("{}{}{}", prefix, replacement, suffix);

        match minimal_replacement(&original, &formatted) {
            None => prop_assert_eq!(&original, &formatted),
            Some(edit) => {
                prop_assert_eq!(edit.apply(&original), formatted.clone());
                // the kept prefix is at least as long as the shared one
                prop_assert!(edit.start >= prefix.len());
                prop_assert!(edit.start <= edit.end);
            }
        }
    }
}

// Any two texts are related by a minimal edit that lands on char boundaries
proptest! {
    #[test]
    fn prop_minimal_edit_between_arbitrary_texts(original in arb_text(), formatted in arb_text()) {
        if let Some(edit) = minimal_replacement(&original, &formatted) {
            prop_assert!(original.is_char_boundary(edit.start));
            prop_assert!(original.is_char_boundary(edit.end));
            prop_assert_eq!(edit.apply(&original), formatted);
        }
    }
}

#[test]
fn full_document_mode_spans_whole_document() {
    let doc = document("const a = 1\nconst b = 2\n");
    let edits = EditComputer
        .compute(&doc, "const a = 1;\nconst b = 2;\n", EditMode::FullDocument)
        .into_edits();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].range, doc.full_range());
}
