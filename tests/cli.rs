use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use tempfile::tempdir;

fn cargo_bin() -> &'static str {
    "jsonextract"
}

fn ndjson(out: &[u8]) -> Vec<Value> {
    std::str::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn cli_stdin_stdout_basic() {
    let mut cmd = Command::cargo_bin(cargo_bin()).unwrap();
    let input = "Sure! ```json\n{\"a\": 1, \"b\": [true]}\n``` Let me know.";
    cmd.write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::function(|out: &[u8]| {
            std::str::from_utf8(out)
                .ok()
                .and_then(|s| serde_json::from_str::<Value>(s).ok())
                == Some(json!({"a": 1, "b": [true]}))
        }));
}

#[test]
fn cli_show_strategy_on_stderr() {
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .arg("--show-strategy")
        .write_stdin("{'a': 1}")
        .assert()
        .success()
        .stdout("{\"a\":1}\n")
        .stderr(predicate::str::contains("strategy: tolerant_recovery"));
}

#[test]
fn cli_strict_rejects_tolerant_input() {
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .arg("--strict")
        .write_stdin("{'a': 1}")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn cli_no_structure_exits_with_failure() {
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .write_stdin("I am just prose.")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No JSON structure found"));
}

#[test]
fn cli_usage_errors_exit_2() {
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .arg("--bogus")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown option"));
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .args(["--chunk-size", "zero"])
        .assert()
        .code(2);
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .args(["--stream", "--fragments"])
        .assert()
        .code(2);
}

#[test]
fn cli_help() {
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("--fragments"));
}

#[test]
fn cli_file_to_file_pretty() {
    let dir = tempdir().unwrap();
    let inp = dir.path().join("in.txt");
    let out = dir.path().join("out.json");
    fs::write(&inp, "result: {\"name\": \"Ada\", \"langs\": [\"rust\"").unwrap();
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .args([
            "--pretty",
            inp.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();
    let s = fs::read_to_string(out).unwrap();
    assert!(s.contains('\n'));
    let v: Value = serde_json::from_str(&s).unwrap();
    assert_eq!(v, json!({"name": "Ada", "langs": ["rust"]}));
}

#[test]
fn cli_stream_prints_each_new_value() {
    let out = Command::cargo_bin(cargo_bin())
        .unwrap()
        .args(["--stream", "--chunk-size", "8"])
        .write_stdin(r#"{"name": "Alice", "age": 30}"#)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let values = ndjson(&out);
    assert!(values.len() > 1);
    assert_eq!(values.last(), Some(&json!({"name": "Alice", "age": 30})));
    assert!(values.windows(2).all(|w| w[0] != w[1]));
}

#[test]
fn cli_stream_without_value_fails() {
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .arg("--stream")
        .write_stdin("nothing to see")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Stream ended"));
}

#[test]
fn cli_fragments_emit_events() {
    let input = [
        r#"{"content_delta": "[{\"id\": 1}, "}"#,
        r#"{"content_delta": "{\"id\": 2}]"}"#,
        r#"{"tool_name": "search", "tool_args_delta": "{\"q\": \"x\"}"}"#,
        r#"{"finish": "stop"}"#,
    ]
    .join("\n");
    let out = Command::cargo_bin(cargo_bin())
        .unwrap()
        .arg("--fragments")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let events = ndjson(&out);
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "ready",
            "ready",
            "sequence_confirmed",
            "suppress",
            "tool_call_partial",
            "suppress",
            "sequence_final",
            "tool_call_final"
        ]
    );
    assert_eq!(events[2]["items"], json!([{"id": 1}]));
    assert_eq!(events[6]["items"], json!([{"id": 1}, {"id": 2}]));
    assert_eq!(events[7]["arguments"], json!({"q": "x"}));
}

#[test]
fn cli_config_file_and_sequence_flag() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.json");
    fs::write(&cfg, r#"{"strategies": ["direct"]}"#).unwrap();
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .args(["--config", cfg.to_str().unwrap()])
        .write_stdin("{\"a\": 1")
        .assert()
        .code(1);

    let input = r#"{"content_delta": "{\"items\": [1, 2, 3]}"}"#;
    let out = Command::cargo_bin(cargo_bin())
        .unwrap()
        .args(["--fragments", "--sequence"])
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let events = ndjson(&out);
    assert!(events.iter().any(|e| e["event"] == "sequence_final"
        && e["items"] == json!([1, 2, 3])));
}

#[test]
fn cli_bad_fragment_line_fails() {
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .arg("--fragments")
        .write_stdin("{not a fragment\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("fragment"));
}
