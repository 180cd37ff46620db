//! Two contexts writing the same key at once: last write wins, nobody fails.

use std::sync::{Arc, Barrier};
use std::thread;

use herald_core::DocumentKey;
use herald_store::FileStore;
use serde_json::{json, Value};
use tempfile::TempDir;

const ROUNDS: usize = 300;

fn payload(writer: usize, round: usize) -> Value {
    json!({
        "writer": writer,
        "round": round,
        "body": "x".repeat(4096),
    })
}

#[test]
fn simultaneous_writers_never_fail_and_one_complete_document_wins() {
    let home = TempDir::new().expect("home");
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|writer| {
            let store = FileStore::at(home.path());
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut errors = Vec::new();
                for round in 0..ROUNDS {
                    if let Err(err) = store.write(&DocumentKey::Home, &payload(writer, round)) {
                        errors.push(err.to_string());
                    }
                }
                errors
            })
        })
        .collect();

    for handle in handles {
        let errors = handle.join().expect("writer thread");
        assert!(errors.is_empty(), "write errors: {errors:?}");
    }

    let stored = FileStore::at(home.path())
        .read(&DocumentKey::Home)
        .expect("final payload decodes");
    let writer = stored["writer"].as_u64().expect("writer") as usize;
    assert!(writer < 2);
    assert_eq!(stored, payload(writer, ROUNDS - 1));
}

#[test]
fn no_temp_files_survive_concurrent_writes() {
    let home = TempDir::new().expect("home");
    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|writer| {
            let store = FileStore::at(home.path());
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for round in 0..50 {
                    store
                        .write(&DocumentKey::News, &payload(writer, round))
                        .expect("write");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let leftovers: Vec<String> = std::fs::read_dir(home.path().join(".herald/store"))
        .expect("store dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
}
