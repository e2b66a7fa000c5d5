use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

fn units(n: usize, out: &Path) -> Vec<Unit> {
    (0..n)
        .map(|i| Unit::new(&PathBuf::from(format!("scripts/s{i}.json")), out))
        .collect()
}

fn job(unit: &Unit) -> StageResult {
    if unit.id.ends_with('1') {
        StageResult::failure(&unit.id, &unit.output_path, "render: renderer missing")
    } else {
        StageResult::success(&unit.id, &unit.output_path, 10)
    }
}

#[test]
fn discovery_filters_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.json", "a.json", "package.json", "notes.txt", "c.JSON"] {
        std::fs::write(dir.path().join(name), "{}").unwrap();
    }
    std::fs::create_dir(dir.path().join("d.json")).unwrap();
    let out = dir.path().join("out");
    let found = discover_units(dir.path(), &out).unwrap();
    let ids: Vec<&str> = found.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(found[0].output_path, out.join("a.mp4"));
    assert_ne!(found[0].work_dir, found[1].work_dir);
    assert!(found[0].work_dir.starts_with(out.join(".work")));
}

#[test]
fn missing_directory_is_an_error() {
    assert!(discover_units(Path::new("/definitely/not/here"), Path::new("out")).is_err());
}

#[test]
fn failures_do_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let us = units(3, dir.path());
    let opts = BatchOptions::default().with_summary_in(dir.path());
    let report = run_all(&us, &opts, job).unwrap();

    let ids: Vec<&str> = report.results.iter().map(|r| r.unit_id.as_str()).collect();
    assert_eq!(ids, ["s0", "s1", "s2"]);
    assert_eq!(report.summary.success, 2);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.total_bytes, 20);
    assert!(report.summary.complete);

    let on_disk = BatchSummary::load(&dir.path().join(SUMMARY_FILE_NAME)).unwrap();
    assert!(on_disk.complete);
    assert_eq!(on_disk.results, report.results);
}

#[test]
fn panicking_unit_is_isolated() {
    let us = units(3, Path::new("out"));
    let report = run_all(&us, &BatchOptions::default(), |u: &Unit| {
        if u.id == "s0" {
            panic!("bad unit");
        }
        StageResult::success(&u.id, &u.output_path, 1)
    })
    .unwrap();
    assert!(!report.results[0].succeeded);
    assert!(report.results[0].error.as_deref().unwrap().contains("bad unit"));
    assert!(report.results[1].succeeded && report.results[2].succeeded);
}

#[test]
fn summary_is_rewritten_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let summary_path = dir.path().join(SUMMARY_FILE_NAME);
    let us = units(3, dir.path());
    let opts = BatchOptions::default().with_summary_in(dir.path());
    let seen = Mutex::new(Vec::new());
    run_all(&us, &opts, |u: &Unit| {
        if summary_path.exists() {
            let s = BatchSummary::load(&summary_path).unwrap();
            seen.lock().unwrap().push((s.results.len(), s.complete));
        }
        StageResult::success(&u.id, &u.output_path, 1)
    })
    .unwrap();
    assert_eq!(seen.into_inner().unwrap(), [(1, false), (2, false)]);
}

#[test]
fn bounded_pool_keeps_submission_order() {
    let us = units(16, Path::new("out"));
    let in_flight = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let opts = BatchOptions { concurrency: 3, summary_path: None };
    let report = run_all(&us, &opts, |u: &Unit| {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(5));
        in_flight.fetch_sub(1, Ordering::SeqCst);
        job(u)
    })
    .unwrap();

    assert!(peak.load(Ordering::SeqCst) <= 3);
    let ids: Vec<String> = report.results.iter().map(|r| r.unit_id.clone()).collect();
    let expected: Vec<String> = (0..16).map(|i| format!("s{i}")).collect();
    assert_eq!(ids, expected);
    // s1 and s11 fail.
    assert_eq!(report.summary.failed, 2);
}

#[test]
fn zero_concurrency_is_rejected() {
    let opts = BatchOptions { concurrency: 0, summary_path: None };
    assert!(run_all(&[], &opts, job).is_err());
}

#[test]
fn unwritable_summary_still_returns_report() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "a file, not a directory").unwrap();
    let us = units(2, dir.path());
    let opts = BatchOptions::default().with_summary_in(&blocker);

    let report = run_all(&us, &opts, job).unwrap();
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.summary.failed, 1);
    assert!(report.summary.complete);
    assert!(!blocker.join(SUMMARY_FILE_NAME).exists());
}
