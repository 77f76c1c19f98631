//! End-to-end memoization scenario across simulated process lifetimes.
//!
//! Each "run" builds a fresh wrapper over the same cache directory and
//! source file, the way separate executions of one program would. Covers
//! warm-start replay with zero invocations and recomputation after the
//! source file is edited.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use recall::MemoBuilder;
use tempfile::TempDir;

fn write_source(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("pricing.rs");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_add_scenario_across_runs() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "fn add(x: i64, y: i64) -> i64 { x + y }");
    let calls = Rc::new(Cell::new(0u32));

    let build = |calls: &Rc<Cell<u32>>| {
        let calls = Rc::clone(calls);
        MemoBuilder::new("add")
            .source_file(&source)
            .cache_dir(tmp.path())
            .wrap_fn(move |&(x, y): &(i64, i64)| {
                calls.set(calls.get() + 1);
                x + y
            })
            .unwrap()
    };

    // Run 1: first call computes, second replays
    {
        let mut add = build(&calls);
        assert_eq!(add.get(&(2, 3)), 5);
        assert_eq!(calls.get(), 1);
        assert_eq!(add.get(&(2, 3)), 5);
        assert_eq!(calls.get(), 1);
    }

    // Run 2: unchanged source, replayed with zero invocations this run
    {
        let mut add = build(&calls);
        assert_eq!(add.entry_count(), 1);
        assert_eq!(add.get(&(2, 3)), 5);
        assert_eq!(calls.get(), 1);
    }

    // Edit the source, then run 3: cache invalidated, recomputed once
    write_source(tmp.path(), "fn add(x: i64, y: i64) -> i64 { y + x }");
    {
        let mut add = build(&calls);
        assert_eq!(add.entry_count(), 0);
        assert_eq!(add.get(&(2, 3)), 5);
        assert_eq!(calls.get(), 2);
        assert_eq!(add.get(&(2, 3)), 5);
        assert_eq!(calls.get(), 2);
    }
}

#[test]
fn test_cache_file_survives_and_is_replayed_verbatim() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "fn describe(n: u32) -> String");

    let build = || {
        MemoBuilder::new("describe")
            .source_file(&source)
            .cache_dir(tmp.path())
            .wrap_fn(|n: &u32| format!("value is {n}"))
            .unwrap()
    };

    let expected_path = tmp.path().join("pricing.describe.cache");

    {
        let mut describe = build();
        assert_eq!(describe.get(&7), "value is 7");
        assert_eq!(describe.cache_path(), Some(expected_path.as_path()));
    }
    assert!(expected_path.exists());

    let mut describe = build();
    assert_eq!(describe.get(&7), "value is 7");
}

#[test]
fn test_corrupt_cache_file_recovers_by_recomputing() {
    let tmp = TempDir::new().unwrap();
    let source = write_source(tmp.path(), "fn add");
    let calls = Rc::new(Cell::new(0u32));

    let build = |calls: &Rc<Cell<u32>>| {
        let calls = Rc::clone(calls);
        MemoBuilder::new("add")
            .source_file(&source)
            .cache_dir(tmp.path())
            .wrap_fn(move |&(x, y): &(i64, i64)| {
                calls.set(calls.get() + 1);
                x + y
            })
            .unwrap()
    };

    {
        let mut add = build(&calls);
        assert_eq!(add.get(&(2, 3)), 5);
    }

    // Clobber the cache file with garbage between runs
    fs::write(tmp.path().join("pricing.add.cache"), "not json at all{{{").unwrap();

    let mut add = build(&calls);
    assert_eq!(add.entry_count(), 0);
    assert_eq!(add.get(&(2, 3)), 5);
    assert_eq!(calls.get(), 2);

    // And the rewritten cache is valid again for the next run
    let mut add = build(&calls);
    assert_eq!(add.get(&(2, 3)), 5);
    assert_eq!(calls.get(), 2);
}
