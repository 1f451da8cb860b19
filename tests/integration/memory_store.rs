use clawprint_agent::memory::MemoryStore;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

#[test]
fn invalid_json_reads_as_missing_and_set_repairs() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("memory.json");
    fs::write(&path, "not json at all").unwrap();

    let store = MemoryStore::open(&path).unwrap();
    assert_eq!(store.get("anything"), None);

    store.set("k", json!({"nested": [1, 2]})).unwrap();
    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["version"], 1);
    assert_eq!(on_disk["data"], json!({"k": {"nested": [1, 2]}}));
}

#[test]
fn deleted_file_reads_empty_and_is_recreated_on_set() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("memory.json");
    let store = MemoryStore::open(&path).unwrap();
    store.set("a", json!(1)).unwrap();

    fs::remove_file(&path).unwrap();
    assert!(store.get_all().is_empty());

    store.set("b", json!(2)).unwrap();
    assert_eq!(store.get("a"), None);
    assert_eq!(store.get("b"), Some(json!(2)));
}

#[test]
fn writes_leave_no_temporary_file() {
    let temp = TempDir::new().unwrap();
    let store = MemoryStore::open(temp.path().join("memory.json")).unwrap();
    store.set("a", json!("x")).unwrap();

    let names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["memory.json"]);
}

#[test]
fn get_all_is_a_copy() {
    let temp = TempDir::new().unwrap();
    let store = MemoryStore::open(temp.path().join("memory.json")).unwrap();
    store.set("a", json!(1)).unwrap();

    let mut all = store.get_all();
    all.insert("b".to_string(), json!(2));
    assert_eq!(store.get("b"), None);
}

#[test]
fn concurrent_writers_never_fail() {
    let temp = TempDir::new().unwrap();
    let store = MemoryStore::open(temp.path().join("memory.json")).unwrap();

    let workers: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            std::thread::spawn(move || {
                (0..200)
                    .filter(|i| store.set(&format!("k{}", t), json!(i)).is_err())
                    .count()
            })
        })
        .collect();
    let failures: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();
    assert_eq!(failures, 0);

    // Last writer wins per file, but the document is always complete.
    let all = store.get_all();
    assert!(!all.is_empty());
    assert!(all.values().all(Value::is_number));

    let names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["memory.json"]);
}
