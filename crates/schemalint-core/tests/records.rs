//! Rendered output lines for whole runs.

use schemalint_core::{
    Detector, Formatter, Layout, Loader, LoaderStream, MemorySource, MessageError, Stream,
    WithMessages,
};

fn render(files: &[(&str, &str)], layout: Layout, messages: Vec<MessageError>) -> Vec<String> {
    let mut source = MemorySource::new();
    for (name, content) in files {
        source.insert(*name, *content);
    }
    let root = files[0].0;
    let stream = WithMessages::new(
        LoaderStream::new(Loader::with_source(root, Box::new(source))),
        messages,
    );
    let formatter = Formatter::new(Detector::new(root), layout).with_base_dir(None);
    stream
        .events()
        .map(|event| formatter.format(&event).unwrap())
        .collect()
}

#[test]
fn ltsv_missing_file() {
    let lines = render(
        &[("a.yaml", "x: {$ref: missing.yaml}\n")],
        Layout::Ltsv,
        vec![],
    );
    insta::assert_snapshot!(
        lines.join("\n"),
        @r#"status:ERROR	cls:ResolutionError	filename:a.yaml	start:1@5	end:1@23	msg:file not found: missing.yaml	where:["a.yaml:1"]"#
    );
}

#[test]
fn json_missing_key_in_included_file() {
    let lines = render(
        &[
            ("a.yaml", "x: {$ref: 'b.yaml#/missing_key'}\n"),
            ("b.yaml", "y: 1\n"),
        ],
        Layout::Json,
        vec![],
    );
    insta::assert_snapshot!(
        lines.join("\n"),
        @r#"{"status":"WARNING","cls":"ResolutionError","filename":"a.yaml","start":"1@5","end":"1@32","msg":"key not found: 'missing_key' (in /missing_key)","where":["a.yaml:1","b.yaml"]}"#
    );
}

#[test]
fn messages_follow_resolution_errors() {
    let lines = render(
        &[("conf/app.yaml", "db:\n  $ref: db.yaml\n")],
        Layout::Json,
        vec![MessageError::info("no schema discovered for conf/app.yaml")],
    );
    insta::assert_snapshot!(
        lines.join("\n"),
        @r#"
    {"status":"ERROR","cls":"ResolutionError","filename":"conf/app.yaml","start":"2@3","end":"2@16","msg":"file not found: conf/db.yaml","where":["conf/app.yaml:2"]}
    {"status":"INFO","cls":"MessageError","filename":"conf/app.yaml","start":"1@1","end":"1@1","msg":"no schema discovered for conf/app.yaml","where":["conf/app.yaml"]}
    "#
    );
}

#[test]
fn parse_error_in_included_file_names_both_files() {
    let lines = render(
        &[
            ("a.yaml", "first: 1\nx: {$ref: 'b.yaml#/k'}\n"),
            ("b.yaml", "k: [1, 2\n"),
        ],
        Layout::Json,
        vec![],
    );
    assert_eq!(lines.len(), 1);
    let record: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(record["cls"], "ParseError");
    assert_eq!(record["status"], "WARNING");
    assert_eq!(record["start"], "2@5");
    let trail = record["where"].as_array().unwrap();
    assert_eq!(trail[0], "a.yaml:2");
    assert!(trail[1].as_str().unwrap().starts_with("b.yaml:"));
}
