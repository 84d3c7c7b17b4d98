// Property-based tests for command line flag translation
// Every scalar option becomes exactly one flag in kebab-case, booleans use
// the `--no-` form when false, and file path and plugins get dedicated flags.

use fmtbridge_module::process::{format_args, option_flags, NO_IGNORE_FILE};
use fmtbridge_module::OptionMap;
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_option_name() -> impl Strategy<Value = String> {
    "[a-z]{2,6}([A-Z][a-z]{1,5}){0,2}"
}

fn kebab(name: &str) -> String {
    name.chars()
        .flat_map(|c| {
            if c.is_ascii_uppercase() {
                vec!['-', c.to_ascii_lowercase()]
            } else {
                vec![c]
            }
        })
        .collect()
}

// Booleans map to a bare flag or its negation, never with a value
proptest! {
    #[test]
    fn prop_boolean_flags(name in arb_option_name(), value in any::<bool>()) {
        let options: OptionMap = [(name.clone(), Value::Bool(value))].into_iter().collect();
        let flags = option_flags(&options);

        let expected = if value {
            format!("--{}", kebab(&name))
        } else {
            format!("--no-{}", kebab(&name))
        };
        prop_assert_eq!(flags, vec![expected]);
    }
}

// Numbers and strings are a flag followed by the value
proptest! {
    #[test]
    fn prop_valued_flags(name in arb_option_name(), number in 0u32..400, text in "[a-z]{1,8}") {
        let options: OptionMap = [(name.clone(), json!(number))].into_iter().collect();
        prop_assert_eq!(
            option_flags(&options),
            vec![format!("--{}", kebab(&name)), number.to_string()]
        );

        let options: OptionMap = [(name.clone(), json!(text))].into_iter().collect();
        prop_assert_eq!(option_flags(&options), vec![format!("--{}", kebab(&name)), text]);
    }
}

// Each plugin is passed once, after the file path
proptest! {
    #[test]
    fn prop_plugins_repeated(plugins in prop::collection::vec("[a-z-]{3,12}", 0..4)) {
        let mut options = OptionMap::new();
        options.insert("filepath".into(), json!("/ws/src/a.ts"));
        options.insert("plugins".into(), json!(plugins.clone()));

        let flags = option_flags(&options);
        prop_assert_eq!(&flags[..2], &["--stdin-filepath".to_string(), "/ws/src/a.ts".to_string()]);
        let passed: Vec<_> = flags[2..]
            .chunks(2)
            .map(|pair| {
                assert_eq!(pair[0], "--plugin");
                pair[1].clone()
            })
            .collect();
        prop_assert_eq!(passed, plugins);
    }
}

#[test]
fn test_structured_options_are_skipped() {
    let mut options = OptionMap::new();
    options.insert("overrides".into(), json!([{"files": "*.md"}]));
    options.insert("embedded".into(), json!({"x": 1}));
    options.insert("endOfLine".into(), Value::Null);
    assert!(option_flags(&options).is_empty());
}

#[test]
fn test_format_args_disable_formatter_ignore_lookup() {
    let mut options = OptionMap::new();
    options.insert("filepath".into(), json!("/ws/build/out.js"));
    options.insert("semi".into(), json!(false));

    let args = format_args(&options);
    assert!(args.starts_with(&option_flags(&options)));

    let ignore = args.iter().position(|a| a == "--ignore-path").unwrap();
    assert_eq!(args[ignore + 1], NO_IGNORE_FILE);
    for flag in ["--no-config", "--no-editorconfig", "--with-node-modules"] {
        assert!(args.iter().any(|a| a == flag), "missing {}", flag);
    }
}
