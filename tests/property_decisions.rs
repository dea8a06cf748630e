//! Property-based tests for path matching and evaluation
//!
//! Uses proptest to check path wildcards, idempotent evaluation and typed
//! equality across generated inputs

use proptest::prelude::*;
use rubac::interpreter::{evaluate, ExecutionEnvironment};
use rubac::workflow::PathPattern;
use rubac::{parse, Builtins, Value};

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,8}"
}

proptest! {
    #[test]
    fn prop_wildcard_matches_any_suffix(
        prefix in prop::collection::vec(segment(), 0..4),
        suffix in prop::collection::vec(segment(), 0..6),
    ) {
        let mut pattern = prefix.clone();
        pattern.push("*".to_string());
        let pattern = PathPattern::new(&pattern.join("/"));

        let mut path = prefix;
        path.extend(suffix);
        let path = format!("/{}", path.join("/"));

        prop_assert!(pattern.matches(&path), "{} should match {}", pattern.as_str(), path);
    }

    #[test]
    fn prop_literal_pattern_matches_only_itself(
        segments in prop::collection::vec(segment(), 1..5),
        other in segment(),
    ) {
        let literal = segments.join("/");
        let pattern = PathPattern::new(&literal);

        let wrapped = format!("/{}/", literal);
        let longer = format!("{}/{}", literal, other);
        prop_assert!(pattern.matches(&literal));
        prop_assert!(pattern.matches(&wrapped));
        prop_assert!(!pattern.matches(&longer));

        let mut changed = segments.clone();
        let last = changed.len() - 1;
        if changed[last] != other {
            changed[last] = other;
            let changed = changed.join("/");
            prop_assert!(!pattern.matches(&changed));
        }
    }

    #[test]
    fn prop_equality_is_idempotent_and_typed(
        text in "[A-Za-z0-9 ]{0,12}",
        number in 0u32..10_000,
    ) {
        let builtins = Builtins::standard();
        let mut env = ExecutionEnvironment::new(&builtins);
        env.bind("text", Value::from(text.as_str()));
        env.bind("number", Value::from(number as f64));

        let same_text = parse(&format!("$text == '{}'", text)).unwrap();
        let same_number = parse(&format!("$number == {}", number)).unwrap();
        let cross = parse(&format!("$number == '{}'", number)).unwrap();

        for _ in 0..3 {
            prop_assert_eq!(evaluate(&same_text, &env).unwrap(), Value::Bool(true));
            prop_assert_eq!(evaluate(&same_number, &env).unwrap(), Value::Bool(true));
            prop_assert_eq!(evaluate(&cross, &env).unwrap(), Value::Bool(false));
        }
    }

    #[test]
    fn prop_ip_range_v4_prefix(a in 0u8..=255, b in 0u8..=255, host in 0u8..=255) {
        let builtins = Builtins::standard();
        let env = ExecutionEnvironment::new(&builtins);
        let rule = parse(&format!("ip_range('{}.{}.7.{}', '{}.{}.0.0/16')", a, b, host, a, b)).unwrap();
        prop_assert_eq!(evaluate(&rule, &env).unwrap(), Value::Bool(true));

        let other = parse(&format!("ip_range('{}.{}.7.{}', '{}.{}.0.0/16')", a, b, host, a, b.wrapping_add(1))).unwrap();
        prop_assert_eq!(evaluate(&other, &env).unwrap(), Value::Bool(false));
    }
}
