use framesmith_telemetry::summarize_file;

#[test]
fn summarizes_log_file_with_garbage_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.jsonl");
    std::fs::write(
        &path,
        concat!(
            "# exported from build 0.9.3\n",
            "{\"type\":\"level_up\",\"timestamp\":30,\"level\":2}\n",
            "{\"type\":\"level_up\",\"timestamp\":95,\"level\":3}\n",
            "{\"event\":\"death\",\"t\":120.5,\"cause\":\"spikes\"}\n",
            "{\"event\":\"death\",\n",
            "\n",
        ),
    )
    .unwrap();

    let summary = summarize_file(&path).unwrap();
    assert_eq!(summary.lines, 4);
    assert_eq!(summary.parsed, 3);
    assert_eq!(summary.malformed, 1);
    assert_eq!(summary.by_event["level_up"], 2);
    assert_eq!(summary.span_secs(), Some(90.5));
    assert_eq!(summary.numeric_fields["level"].max, 3.0);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["by_event"]["death"], 1);
}

#[test]
fn non_utf8_log_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.jsonl");
    std::fs::write(&path, [0xc3, 0x28]).unwrap();
    assert!(summarize_file(&path).is_err());
}
