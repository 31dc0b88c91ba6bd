use super::{CatalogError, ClassConfig, DecisionEngine, KeyConfig, LimitCatalog, MemoryStore, Verdict};
use std::time::{Duration, SystemTime};

fn class(name: &str, keys: &[(&str, u64, u64)]) -> ClassConfig {
    ClassConfig {
        name: name.to_string(),
        keys: keys
            .iter()
            .map(|(pattern, window_secs, limit)| KeyConfig {
                pattern: pattern.to_string(),
                window_secs: *window_secs,
                limit: *limit,
            })
            .collect(),
    }
}

fn engine(classes: Vec<ClassConfig>) -> DecisionEngine<MemoryStore> {
    let catalog = LimitCatalog::builder().build(classes).unwrap();
    DecisionEngine::new(catalog, MemoryStore::new())
}

#[test]
fn test_first_request_allowed() {
    let mut engine = engine(vec![class("ip", &[("10.0.0.*", 90, 10)])]);

    let verdict = engine.decide("ip 10.0.0.4", SystemTime::now());
    assert_eq!(verdict, Verdict::Allowed { count: 1, limit: 10 });
    assert_eq!(verdict.to_string(), "0 1/10");
    assert_eq!(verdict.code(), 0);
}

#[test]
fn test_limit_boundary() {
    let mut engine = engine(vec![class("ip", &[("10.0.0.*", 90, 10)])]);
    let now = SystemTime::now();

    // Ten requests inside the window stay at or under the limit
    for i in 1..=10u64 {
        let verdict = engine.decide("ip 10.0.0.4", now + Duration::from_secs(i));
        assert_eq!(verdict, Verdict::Allowed { count: i, limit: 10 });
    }

    // The eleventh goes over
    let verdict = engine.decide("ip 10.0.0.4", now + Duration::from_secs(11));
    assert_eq!(verdict, Verdict::Exceeded { count: 11, limit: 10 });
    assert_eq!(verdict.to_string(), "1 11/10");
    assert_eq!(verdict.code(), 1);
}

#[test]
fn test_bad_input_without_space() {
    let mut engine = engine(vec![class("ip", &[("*", 90, 10)])]);

    let verdict = engine.decide("badlinewithoutspace", SystemTime::now());
    assert_eq!(verdict, Verdict::BadInput);
    assert_eq!(verdict.to_string(), "2 Bad Input (no space)");
    assert_eq!(verdict.code(), 2);
}

#[test]
fn test_unknown_class_reports_raw_line() {
    let mut engine = engine(vec![class("ip", &[("*", 90, 10)])]);

    let verdict = engine.decide("nosuchclass foo", SystemTime::now());
    assert_eq!(verdict, Verdict::UnknownClass("nosuchclass foo".to_string()));
    assert_eq!(verdict.to_string(), "2 Class not found: nosuchclass foo");
}

#[test]
fn test_no_matching_key_is_answered() {
    // The class exists but no pattern matches; the request still gets a
    // verdict instead of silence.
    let mut engine = engine(vec![class("user", &[("joe*", 60, 5)])]);

    let verdict = engine.decide("user bob", SystemTime::now());
    assert_eq!(verdict, Verdict::NoMatchingKey("bob".to_string()));
    assert_eq!(verdict.to_string(), "2 No matching key: bob");
}

#[test]
fn test_first_match_wins() {
    // "joey" matches both "joe*" and "*"; only the first key's limit applies
    let mut engine = engine(vec![class(
        "user",
        &[("joe*", 60, 5), ("*", 60, 1)],
    )]);
    let now = SystemTime::now();

    for i in 1..=5u64 {
        let verdict = engine.decide("user joey", now + Duration::from_secs(i));
        assert_eq!(verdict, Verdict::Allowed { count: i, limit: 5 });
    }
    let verdict = engine.decide("user joey", now + Duration::from_secs(6));
    assert_eq!(verdict, Verdict::Exceeded { count: 6, limit: 5 });

    // "bob" falls through to the catch-all with limit 1
    let verdict = engine.decide("user bob", now);
    assert_eq!(verdict, Verdict::Allowed { count: 1, limit: 1 });
    let verdict = engine.decide("user bob", now + Duration::from_secs(1));
    assert_eq!(verdict, Verdict::Exceeded { count: 2, limit: 1 });
}

#[test]
fn test_counts_are_scoped_by_class() {
    // The same value under two classes is two independent counts
    let mut engine = engine(vec![
        class("username", &[("*", 60, 10)]),
        class("hostname", &[("*", 60, 10)]),
    ]);
    let now = SystemTime::now();

    assert_eq!(
        engine.decide("username joe", now),
        Verdict::Allowed { count: 1, limit: 10 }
    );
    assert_eq!(
        engine.decide("hostname joe", now),
        Verdict::Allowed { count: 1, limit: 10 }
    );
}

#[test]
fn test_marks_outside_window_are_not_counted() {
    let mut engine = engine(vec![class("ip", &[("*", 90, 10)])]);
    let start = SystemTime::now();

    assert_eq!(
        engine.decide("ip 10.0.0.4", start),
        Verdict::Allowed { count: 1, limit: 10 }
    );

    // 91 seconds later the first mark has slid out of the 90s window
    let later = start + Duration::from_secs(91);
    assert_eq!(
        engine.decide("ip 10.0.0.4", later),
        Verdict::Allowed { count: 1, limit: 10 }
    );
}

#[test]
fn test_purge_then_count() {
    let mut engine = engine(vec![class("ip", &[("*", 90, 10)])]);
    let t0 = SystemTime::now();

    engine.decide("ip 10.0.0.4", t0);

    // Purge with age 30 at t0+31 removes the mark entirely
    let purged = engine
        .purge_older_than(Duration::from_secs(30), t0 + Duration::from_secs(31))
        .unwrap();
    assert_eq!(purged, 1);

    assert_eq!(
        engine.decide("ip 10.0.0.4", t0 + Duration::from_secs(31)),
        Verdict::Allowed { count: 1, limit: 10 }
    );
}

#[test]
fn test_value_may_contain_spaces() {
    // Only the first space splits; the rest is the value
    let mut engine = engine(vec![class("msg", &[("hello *", 60, 3)])]);

    let verdict = engine.decide("msg hello big world", SystemTime::now());
    assert_eq!(verdict, Verdict::Allowed { count: 1, limit: 3 });
}

#[test]
fn test_empty_value_matches_catch_all() {
    let mut engine = engine(vec![class("msg", &[("*", 60, 3)])]);

    let verdict = engine.decide("msg ", SystemTime::now());
    assert_eq!(verdict, Verdict::Allowed { count: 1, limit: 3 });
}

#[test]
fn test_glob_is_case_sensitive_and_full_string() {
    let mut engine = engine(vec![class("user", &[("joe*", 60, 5)])]);
    let now = SystemTime::now();

    assert_eq!(
        engine.decide("user Joey", now),
        Verdict::NoMatchingKey("Joey".to_string())
    );
    // A prefix of the pattern does not match
    let mut engine = engine_with_pattern("jo?");
    assert_eq!(
        engine.decide("user jo", now),
        Verdict::NoMatchingKey("jo".to_string())
    );
    assert_eq!(
        engine.decide("user job", now),
        Verdict::Allowed { count: 1, limit: 5 }
    );
}

fn engine_with_pattern(pattern: &str) -> DecisionEngine<MemoryStore> {
    engine(vec![class("user", &[(pattern, 60, 5)])])
}

#[test]
fn test_every_input_gets_a_verdict() {
    let mut engine = engine(vec![class("user", &[("joe*", 60, 5)])]);
    let now = SystemTime::now();

    // No input may fall through without a reply
    for line in [
        "", " ", "user joe", "user bob", "other joe", "noseparator", "user ",
        "user joe extra words",
    ] {
        let verdict = engine.decide(line, now);
        assert!(verdict.code() <= 2, "line {line:?} produced {verdict:?}");
        assert!(!verdict.to_string().is_empty());
    }
}

#[test]
fn test_catalog_lookup_is_idempotent() {
    let catalog = LimitCatalog::builder()
        .build(vec![class("ip", &[("10.0.0.*", 90, 10), ("*", 60, 2)])])
        .unwrap();

    let first: Vec<_> = catalog
        .lookup("ip")
        .unwrap()
        .keys()
        .iter()
        .map(|key| (key.pattern().to_string(), key.window(), key.limit()))
        .collect();
    let second: Vec<_> = catalog
        .lookup("ip")
        .unwrap()
        .keys()
        .iter()
        .map(|key| (key.pattern().to_string(), key.window(), key.limit()))
        .collect();

    assert_eq!(first, second);
    assert!(catalog.lookup("missing").is_none());
}

#[test]
fn test_catalog_rejects_long_class_name() {
    let long_name = "x".repeat(50);
    let result = LimitCatalog::builder().build(vec![class(&long_name, &[("*", 60, 1)])]);
    assert!(matches!(
        result,
        Err(CatalogError::ClassNameTooLong { max: 49, .. })
    ));

    // The bound is configurable, not hard-wired
    let catalog = LimitCatalog::builder()
        .max_class_name_len(64)
        .build(vec![class(&long_name, &[("*", 60, 1)])])
        .unwrap();
    assert!(catalog.lookup(&long_name).is_some());
}

#[test]
fn test_catalog_rejects_duplicate_class() {
    let result = LimitCatalog::builder().build(vec![
        class("ip", &[("*", 60, 1)]),
        class("ip", &[("*", 90, 2)]),
    ]);
    assert!(matches!(result, Err(CatalogError::DuplicateClass(name)) if name == "ip"));
}

#[test]
fn test_catalog_rejects_invalid_pattern() {
    let result = LimitCatalog::builder().build(vec![class("ip", &[("10.0.0.[", 60, 1)])]);
    assert!(matches!(result, Err(CatalogError::InvalidPattern { .. })));
}

#[test]
fn test_catalog_rejects_zero_window() {
    let result = LimitCatalog::builder().build(vec![class("ip", &[("*", 0, 1)])]);
    assert!(matches!(result, Err(CatalogError::ZeroWindow { .. })));
}

#[test]
fn test_catalog_max_window() {
    let catalog = LimitCatalog::builder()
        .build(vec![
            class("ip", &[("*", 90, 10)]),
            class("user", &[("joe*", 60, 5), ("*", 3600, 100)]),
        ])
        .unwrap();

    assert_eq!(catalog.max_window(), Some(Duration::from_secs(3600)));
    assert_eq!(catalog.len(), 2);

    let empty = LimitCatalog::builder().build(vec![]).unwrap();
    assert_eq!(empty.max_window(), None);
    assert!(empty.is_empty());
}

#[test]
fn test_zero_limit_always_exceeds() {
    // A limit of zero is a deny rule: the first mark already exceeds it
    let mut engine = engine(vec![class("banned", &[("*", 60, 0)])]);

    let verdict = engine.decide("banned anyone", SystemTime::now());
    assert_eq!(verdict, Verdict::Exceeded { count: 1, limit: 0 });
    assert_eq!(verdict.to_string(), "1 1/0");
}
