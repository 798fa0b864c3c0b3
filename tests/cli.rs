//! CLI integration tests.
//!
//! Uses `assert_cmd` to spawn the `perfstat` binary against capture files
//! written with the core encoder, and verifies exit codes, stdout lines and
//! stderr diagnostics.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use perfstat_core::{
    CaptureNaming, Encoder, OperationKind, QueryType, RecordBody, SessionId,
};
use predicates::prelude::*;
use tempfile::TempDir;
use uuid::Uuid;

const NODE: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";

fn node() -> Uuid {
    Uuid::parse_str(NODE).unwrap()
}

fn perfstat() -> Command {
    cargo_bin_cmd!("perfstat")
}

fn encode(bodies: &[RecordBody]) -> Vec<u8> {
    let mut enc = Encoder::new();
    let mut buf = Vec::new();
    for body in bodies {
        enc.encode(body, &mut buf);
    }
    buf
}

fn write_capture(dir: &Path, node: Uuid, created_at: u64, bytes: &[u8]) -> PathBuf {
    let path = dir.join(CaptureNaming::default().file_name(node, created_at));
    fs::write(&path, bytes).unwrap();
    path
}

/// Run and return stdout lines, asserting success.
fn lines(cmd: &mut Command) -> Vec<String> {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn cache_start(cache_id: i32, name: &str) -> RecordBody {
    RecordBody::CacheStart {
        cache_id,
        name: name.into(),
    }
}

fn cache_op(kind: OperationKind, cache_id: i32, start_time: i64) -> RecordBody {
    RecordBody::CacheOperation {
        kind,
        cache_id,
        start_time,
        duration: 1,
    }
}

fn tx(committed: bool, cache_ids: &[i32], start_time: i64) -> RecordBody {
    RecordBody::Transaction {
        cache_ids: cache_ids.iter().copied().collect(),
        start_time,
        duration: 2,
        committed,
    }
}

/// Every time-bearing kind at the given start time.
fn timed_records(start_time: i64) -> Vec<RecordBody> {
    let ses = SessionId {
        node_id: node(),
        local_id: 7,
    };
    vec![
        cache_op(OperationKind::CacheGet, 1, start_time),
        tx(true, &[1], start_time),
        tx(false, &[1], start_time),
        RecordBody::Query {
            query_type: QueryType::Sql,
            text: "select 1".into(),
            id: 1,
            start_time,
            duration: 3,
            success: true,
        },
        RecordBody::Task {
            session_id: ses,
            task_name: "task".into(),
            start_time,
            duration: 4,
            affinity_partition_id: -1,
        },
        RecordBody::Job {
            session_id: ses,
            queued_time: 1,
            start_time,
            duration: 5,
            timed_out: false,
        },
    ]
}

/// One record of each record shape.
fn one_of_each() -> Vec<RecordBody> {
    let mut bodies = vec![cache_start(1, "cache")];
    bodies.extend(timed_records(10));
    bodies.push(RecordBody::QueryReads {
        query_type: QueryType::Sql,
        query_node_id: Uuid::from_u128(42),
        id: 1,
        logical_reads: 10,
        physical_reads: 2,
    });
    bodies
}

// ──────────────────────────────────────────────
// Help and usage
// ──────────────────────────────────────────────

#[test]
fn help_exits_0() {
    perfstat()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--cache-ids"));
}

#[test]
fn version_exits_0() {
    perfstat()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("perfstat"));
}

#[test]
fn missing_path_exits_1() {
    let assert = perfstat()
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("perfstat: "));

    // One diagnostic line, without clap's usage block
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert_eq!(stderr.lines().count(), 1, "{stderr}");
    assert!(!stderr.contains("Usage"));
}

#[test]
fn unknown_flag_exits_1() {
    let dir = TempDir::new().unwrap();
    perfstat()
        .arg(dir.path())
        .arg("--bogus")
        .assert()
        .code(1);
}

#[test]
fn unknown_op_kind_exits_1() {
    let dir = TempDir::new().unwrap();
    perfstat()
        .arg(dir.path())
        .args(["--ops", "cache_start"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cache_start"));
}

#[test]
fn missing_input_exits_1_without_creating_output() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.txt");
    perfstat()
        .arg(dir.path().join("absent"))
        .arg("--out")
        .arg(&out)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("not found"));
    assert!(!out.exists());
}

#[test]
fn bad_file_name_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("capture.bin");
    fs::write(&path, encode(&[cache_start(1, "a")])).unwrap();
    perfstat()
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not a capture file name"));
}

#[test]
fn existing_output_file_exits_1_and_is_untouched() {
    let dir = TempDir::new().unwrap();
    write_capture(dir.path(), node(), 1, &encode(&[cache_start(1, "a")]));
    let out = dir.path().join("out.txt");
    fs::write(&out, "previous").unwrap();

    perfstat()
        .arg(dir.path())
        .arg("--out")
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&out).unwrap(), "previous");
}

// ──────────────────────────────────────────────
// Output
// ──────────────────────────────────────────────

#[test]
fn out_file_receives_lines() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_capture(input.path(), node(), 1, &encode(&[cache_start(3, "orders")]));
    let out = output.path().join("report.txt");

    perfstat()
        .arg(input.path())
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        format!("CACHE_START [nodeId={NODE}, cacheId=3, name=orders]\n")
    );
}

#[test]
fn json_lines() {
    let dir = TempDir::new().unwrap();
    write_capture(dir.path(), node(), 1, &encode(&[tx(true, &[1, -2], 10)]));

    let out = lines(perfstat().arg(dir.path()).args(["--format", "json"]));
    assert_eq!(out.len(), 1);
    let value: serde_json::Value = serde_json::from_str(&out[0]).unwrap();
    assert_eq!(value["op"], "TX_COMMIT");
    assert_eq!(value["nodeId"], NODE);
    assert_eq!(value["cacheIds"], "[1, -2]");
    assert_eq!(value["startTime"], 10);
}

#[test]
fn empty_directory_prints_nothing() {
    let dir = TempDir::new().unwrap();
    let out = lines(perfstat().arg(dir.path()));
    assert!(out.is_empty());
}

// ──────────────────────────────────────────────
// Filters
// ──────────────────────────────────────────────

#[test]
fn ops_filter() {
    let dir = TempDir::new().unwrap();
    write_capture(dir.path(), node(), 1, &encode(&one_of_each()));

    let all = lines(perfstat().arg(dir.path()));
    assert_eq!(all.len(), 8);
    for line in &all {
        assert!(line.contains(&format!("nodeId={NODE}")), "{line}");
    }

    let starts = lines(perfstat().arg(dir.path()).args(["--ops", "CACHE_START"]));
    assert_eq!(starts.len(), 1);
    assert!(starts[0].starts_with("CACHE_START "));

    let puts = lines(perfstat().arg(dir.path()).args(["--ops", "CACHE_PUT"]));
    assert!(puts.is_empty());

    let two = lines(perfstat().arg(dir.path()).args(["--ops", "TX_COMMIT,JOB"]));
    assert_eq!(two.len(), 2);
    assert!(two[0].starts_with("TX_COMMIT "));
    assert!(two[1].starts_with("JOB "));
}

#[test]
fn time_window_filter() {
    let dir = TempDir::new().unwrap();
    let mut bodies = timed_records(10);
    bodies.extend(timed_records(20));
    write_capture(dir.path(), node(), 1, &encode(&bodies));

    let at_10 = lines(perfstat().arg(dir.path()).args(["--from", "10", "--to", "10"]));
    assert_eq!(at_10.len(), 6);
    assert!(at_10.iter().all(|l| l.contains("startTime=10")));

    let from_20 = lines(perfstat().arg(dir.path()).args(["--from", "20"]));
    assert_eq!(from_20.len(), 6);
    assert!(from_20.iter().all(|l| l.contains("startTime=20")));

    let all = lines(perfstat().arg(dir.path()));
    assert_eq!(all.len(), 12);
}

#[test]
fn cache_ids_filter() {
    let dir = TempDir::new().unwrap();
    let bodies = vec![
        cache_start(1, "one"),
        cache_op(OperationKind::CacheGet, 1, 5),
        tx(true, &[1], 5),
        cache_start(2, "two"),
        cache_op(OperationKind::CacheGet, 2, 5),
        tx(true, &[2], 5),
    ];
    write_capture(dir.path(), node(), 1, &encode(&bodies));

    let one = lines(perfstat().arg(dir.path()).args(["--cache-ids", "1"]));
    assert_eq!(one.len(), 3);
    assert!(one
        .iter()
        .all(|l| l.contains("cacheId=1,") || l.contains("cacheIds=[1]")));

    let negative = lines(perfstat().arg(dir.path()).args(["--cache-ids", "-1"]));
    assert!(negative.is_empty());

    let both = lines(perfstat().arg(dir.path()).args(["--cache-ids", "1,2"]));
    assert_eq!(both.len(), 6);
}

#[test]
fn cache_ids_filter_with_negative_ids() {
    let dir = TempDir::new().unwrap();
    let bodies = vec![
        cache_op(OperationKind::CacheGet, -1, 5),
        cache_op(OperationKind::CacheGet, 1, 5),
        cache_op(OperationKind::CacheGet, 2, 5),
    ];
    write_capture(dir.path(), node(), 1, &encode(&bodies));

    let mixed = lines(perfstat().arg(dir.path()).args(["--cache-ids", "-1,2"]));
    assert_eq!(mixed.len(), 2);
    assert!(mixed[0].contains("cacheId=-1,"));
    assert!(mixed[1].contains("cacheId=2,"));

    let equals = lines(perfstat().arg(dir.path()).arg("--cache-ids=-1"));
    assert_eq!(equals.len(), 1);
}

// ──────────────────────────────────────────────
// Multiple files, truncation, corruption
// ──────────────────────────────────────────────

#[test]
fn rollover_files_in_creation_order() {
    let dir = TempDir::new().unwrap();
    write_capture(dir.path(), node(), 2000, &encode(&[cache_start(2, "later")]));
    write_capture(dir.path(), node(), 1000, &encode(&[cache_start(1, "earlier")]));

    let out = lines(perfstat().arg(dir.path()));
    assert_eq!(
        out,
        vec![
            format!("CACHE_START [nodeId={NODE}, cacheId=1, name=earlier]"),
            format!("CACHE_START [nodeId={NODE}, cacheId=2, name=later]"),
        ]
    );
}

#[test]
fn truncated_stream_exits_0_at_every_cut() {
    let bodies = vec![
        cache_op(OperationKind::CacheGet, 1, 1),
        cache_op(OperationKind::CachePut, 1, 2),
        cache_op(OperationKind::CacheRemove, 1, 3),
    ];
    let full = encode(&bodies);
    let frame_len = full.len() / bodies.len();

    for cut in 0..=full.len() {
        let dir = TempDir::new().unwrap();
        let path = write_capture(dir.path(), node(), 1, &full[..cut]);

        let out = lines(perfstat().arg(&path));
        assert_eq!(out.len(), cut / frame_len, "cut at {cut}");
    }
}

#[test]
fn corrupt_stream_reports_offset_and_others_complete() {
    let dir = TempDir::new().unwrap();
    let other = Uuid::from_u128(1);

    let mut bad = encode(&[cache_start(1, "before")]);
    let offset = bad.len();
    bad.push(0x80);
    bad.extend(encode(&[cache_start(2, "after")]));
    let bad_path = write_capture(dir.path(), node(), 1, &bad);
    write_capture(dir.path(), other, 1, &encode(&[cache_start(3, "other")]));

    let assert = perfstat()
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains(format!(
            "perfstat: corrupt stream {} at offset {offset}",
            bad_path.display()
        )));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("name=before"));
    assert!(!stdout.contains("name=after"));
    assert!(stdout.contains("name=other"));
}

#[test]
fn bad_string_tag_at_end_of_file_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let mut bytes = encode(&[cache_start(1, "before")]);
    let offset = bytes.len();
    // CACHE_START whose string field carries tag 7
    bytes.extend_from_slice(&[0x00, 0, 0, 0, 5, 0x07]);
    let path = write_capture(dir.path(), node(), 1, &bytes);

    perfstat()
        .arg(&path)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("name=before"))
        .stderr(predicate::str::contains(format!(
            "at offset {offset}: invalid string tag 7"
        )));
}
