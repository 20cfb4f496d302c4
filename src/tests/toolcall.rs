use super::*;
use serde_json::json;

fn args_of(call: &ToolCall) -> serde_json::Value {
    serde_json::Value::Object(call.arguments.clone())
}

#[test]
fn tc_args_without_active_call_are_ignored() {
    let t = ToolCallTracker::default().append_args("{\"q\":1}");
    assert!(!t.is_active());
    assert_eq!(t.args(), "");
}

#[test]
fn tc_repeated_name_without_args_is_noop() {
    let t = ToolCallTracker::default()
        .handle_name_signal("search")
        .handle_name_signal("search");
    assert!(t.is_active());
    assert_eq!(t.name(), "search");
    assert!(!t.starts_new_call("search"));
    assert!(t.starts_new_call("lookup"));
}

#[test]
fn tc_partial_arguments_decode_through_chain() {
    let t = ToolCallTracker::default()
        .handle_name_signal("search")
        .append_args("{\"q\":")
        .append_args("\"a");
    let call = t.current_call().unwrap();
    assert_eq!(call.name, "search");
    assert_eq!(args_of(&call), json!({"q": "a"}));
    // decoding does not consume anything
    assert_eq!(t.args(), "{\"q\":\"a");
}

#[test]
fn tc_new_signal_discards_previous_args() {
    let t = ToolCallTracker::default()
        .handle_name_signal("search")
        .append_args("{\"q\":\"a\"}");
    assert!(t.starts_new_call("search"));
    let t = t.handle_name_signal("search");
    assert_eq!(t.args(), "");
    let t = t.append_args("{}").handle_name_signal("lookup");
    assert_eq!(t.name(), "lookup");
    assert_eq!(t.args(), "");
}

#[test]
fn tc_empty_args_decode_to_empty_object() {
    let t = ToolCallTracker::default().handle_name_signal("ping");
    let call = t.finalize().unwrap();
    assert_eq!(call.name, "ping");
    assert!(call.arguments.is_empty());
    let t = t.append_args("   ");
    assert!(t.finalize().unwrap().arguments.is_empty());
}

#[test]
fn tc_non_object_args_are_invalid() {
    let t = ToolCallTracker::default()
        .handle_name_signal("calc")
        .append_args("[1, 2]");
    let err = t.finalize().unwrap_err();
    assert!(matches!(err.kind, ExtractErrorKind::InvalidToolArguments(_)));

    let t = ToolCallTracker::default()
        .handle_name_signal("calc")
        .append_args("not json at all");
    assert_eq!(t.finalize().unwrap_err().kind, ExtractErrorKind::NoStructure);
}

#[test]
fn tc_finalize_keeps_trailing_number() {
    let t = ToolCallTracker::default()
        .handle_name_signal("page")
        .append_args(r#"{"q": "rust", "limit": 25"#);
    assert_eq!(args_of(&t.current_call().unwrap()), json!({"q": "rust"}));
    assert_eq!(
        args_of(&t.finalize().unwrap()),
        json!({"q": "rust", "limit": 25})
    );
}

#[test]
fn tc_clear_returns_to_idle() {
    let t = ToolCallTracker::default()
        .handle_name_signal("search")
        .append_args("{\"q\":\"x\"}");
    assert_eq!(args_of(&t.finalize().unwrap()), json!({"q": "x"}));
    // finalize leaves the state alone
    assert!(t.is_active());
    let t = t.clear();
    assert!(!t.is_active());
    assert_eq!(t.name(), "");
    assert_eq!(t.args(), "");
}

#[test]
fn tc_tool_call_serializes() {
    let call = ToolCall {
        name: "search".to_string(),
        arguments: json!({"q": "rust"}).as_object().cloned().unwrap(),
    };
    let s = serde_json::to_string(&call).unwrap();
    assert_eq!(s, r#"{"name":"search","arguments":{"q":"rust"}}"#);
    let back: ToolCall = serde_json::from_str(&s).unwrap();
    assert_eq!(back, call);
}
