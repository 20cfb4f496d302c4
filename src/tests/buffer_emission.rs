use super::*;
use serde_json::json;
use std::sync::Arc;

fn buffer(text: &str) -> ContentBuffer {
    ContentBuffer::default().assemble(text)
}

#[test]
fn be_assemble_keeps_old_snapshots_intact() {
    let b1 = ContentBuffer::default().assemble("{\"a\"");
    let snapshot = b1.clone();
    let b2 = b1.assemble(": 1}");
    assert_eq!(snapshot.as_str(), "{\"a\"");
    assert_eq!(b2.as_str(), "{\"a\": 1}");
    assert!(b2.as_str().starts_with(snapshot.as_str()));
    assert_eq!(b2.len(), 8);
}

#[test]
fn be_empty_buffer_is_distinct_from_failure() {
    let empty = buffer("  \n");
    assert!(empty.is_empty());
    assert!(empty.parsed().unwrap_err().is_empty_input());

    let prose = buffer("thinking...");
    assert!(!prose.is_empty());
    assert_eq!(prose.parsed().unwrap_err().kind, ExtractErrorKind::NoStructure);
}

#[test]
fn be_normalized_view_closes_dangling_text() {
    assert_eq!(buffer(r#"{"name": "Al"#).normalized(), r#"{"name":"Al"}"#);
    assert_eq!(buffer(r#"Sure: [1, 2,"#).normalized(), "[1,2]");
    assert_eq!(buffer("no json yet").normalized(), "no json yet");
    assert_eq!(
        buffer(r#"Here [is] the JSON: {"a": "x"#).normalized(),
        r#"{"a":"x"}"#
    );
}

#[test]
fn be_complete_parse_keeps_trailing_number() {
    let b = buffer("[1, 2");
    assert_eq!(b.parsed().unwrap().value, json!([1]));
    assert_eq!(b.parsed_complete().unwrap().value, json!([1, 2]));
    assert!(buffer(" ").parsed_complete().unwrap_err().is_empty_input());

    let (policy, first) = EmissionPolicy::new().evaluate(None, &b);
    assert_eq!(first.value(), Some(&json!([1])));
    let (_, last) = policy.evaluate_final(None, &b);
    assert!(last.is_ready());
    assert_eq!(last.value(), Some(&json!([1, 2])));
}

#[test]
fn be_buffer_uses_its_chain() {
    let chain = Arc::new(StrategyChain::new(Options::strict()));
    let b = ContentBuffer::new(chain).assemble("{'a': 1}");
    assert!(b.parsed().is_err());
    assert_eq!(b.chain().names().len(), 5);
}

#[test]
fn be_fingerprint_ignores_key_order() {
    assert_eq!(
        fingerprint(&json!({"a": 1, "b": 2})),
        fingerprint(&json!({"b": 2, "a": 1}))
    );
    assert_eq!(
        fingerprint(&json!({"o": {"x": [1, {"p": 1, "q": 2}]}, "z": null})),
        fingerprint(&json!({"z": null, "o": {"x": [1, {"q": 2, "p": 1}]}}))
    );
}

#[test]
fn be_fingerprint_distinguishes_values() {
    assert_ne!(fingerprint(&json!({"a": 1})), fingerprint(&json!({"a": "1"})));
    assert_ne!(fingerprint(&json!([1, 2])), fingerprint(&json!([2, 1])));
    assert_ne!(fingerprint(&json!(["a,b"])), fingerprint(&json!(["a", "b"])));
    let fp = fingerprint(&json!({"a": 1}));
    let hex = fp.to_string();
    assert_eq!(hex.len(), 64);
    assert!(hex.starts_with(&format!("{:016x}", fp.short())));
}

#[test]
fn be_precomputed_value_is_forwarded() {
    let policy = EmissionPolicy::new();
    let (next, emission) = policy.evaluate(Some(&json!({"done": true})), &buffer("{\"x\""));
    assert_eq!(emission.decision(), EmissionDecision::Forward);
    assert_eq!(emission.value(), Some(&json!({"done": true})));
    assert_eq!(next.last_fingerprint(), None);
}

#[test]
fn be_empty_and_failed_buffers_are_forwarded() {
    let policy = EmissionPolicy::new();
    let (_, emission) = policy.evaluate(None, &ContentBuffer::default());
    assert_eq!(
        emission,
        Emission::Forward {
            value: None,
            failure: None,
            normalized: String::new()
        }
    );

    let (next, emission) = policy.evaluate(None, &buffer("hello"));
    assert_eq!(emission.decision(), EmissionDecision::Forward);
    assert_eq!(emission.failure().unwrap().kind, ExtractErrorKind::NoStructure);
    assert_eq!(emission.normalized(), Some("hello"));
    assert_eq!(next, policy);
}

#[test]
fn be_unchanged_value_is_suppressed() {
    let policy = EmissionPolicy::new();
    let (policy, first) = policy.evaluate(None, &buffer(r#"{"x":1,"#));
    assert!(first.is_ready());
    assert_eq!(first.value(), Some(&json!({"x": 1})));
    assert_eq!(first.normalized(), Some(r#"{"x":1}"#));

    let (policy, second) = policy.evaluate(None, &buffer(r#"{"x":1}"#));
    assert_eq!(second, Emission::Suppress);
    assert_eq!(second.normalized(), None);
    assert_eq!(policy.suppressed(), 1);

    let (_, third) = policy.evaluate(None, &buffer(r#"{"x":2}"#));
    assert!(third.is_ready());
}

#[test]
fn be_comparison_is_against_latest_value() {
    let a = buffer(r#"{"v":"a"}"#);
    let b = buffer(r#"{"v":"b"}"#);
    let p = EmissionPolicy::new();
    let (p, e1) = p.evaluate(None, &a);
    let (p, e2) = p.evaluate(None, &a);
    let (p, e3) = p.evaluate(None, &b);
    let (p, e4) = p.evaluate(None, &a);
    let decisions: Vec<_> = [e1, e2, e3, e4].iter().map(Emission::decision).collect();
    assert_eq!(
        decisions,
        vec![
            EmissionDecision::Ready,
            EmissionDecision::Suppress,
            EmissionDecision::Ready,
            EmissionDecision::Ready
        ]
    );
    assert_eq!(p.last_fingerprint(), Some(fingerprint(&json!({"v": "a"}))));
}

#[test]
fn be_reset_forgets_last_value() {
    let a = buffer("[1]");
    let (p, _) = EmissionPolicy::new().evaluate(None, &a);
    let (_, again) = p.reset().evaluate(None, &a);
    assert!(again.is_ready());
}
