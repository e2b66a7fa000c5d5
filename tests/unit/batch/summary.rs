use std::path::PathBuf;

use super::*;

fn results() -> Vec<StageResult> {
    vec![
        StageResult::success("a", &PathBuf::from("out/a.mp4"), 100),
        StageResult::failure("b", &PathBuf::from("out/b.mp4"), "render: boom"),
        StageResult::success("c", &PathBuf::from("out/c.mp4"), 23),
    ]
}

#[test]
fn counts_and_bytes() {
    let s = BatchSummary::new(4, results(), false);
    assert_eq!(s.total, 4);
    assert_eq!(s.success, 2);
    assert_eq!(s.failed, 1);
    assert_eq!(s.total_bytes, 123);
    assert_eq!(s.pending(), 1);
    let failed: Vec<&str> = s.failures().map(|r| r.unit_id.as_str()).collect();
    assert_eq!(failed, ["b"]);
}

#[test]
fn json_shape() {
    let s = BatchSummary::new(3, results(), true);
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["totalBytes"], 123);
    assert_eq!(v["complete"], true);
    assert_eq!(v["results"][1]["error"], "render: boom");
    let ts = v["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "{ts}");
}

#[test]
fn write_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(SUMMARY_FILE_NAME);
    let s = BatchSummary::new(3, results(), true);
    s.write(&path).unwrap();
    assert_eq!(BatchSummary::load(&path).unwrap(), s);
}
