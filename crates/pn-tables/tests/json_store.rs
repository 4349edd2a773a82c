use pn_core::{Table, Value};
use pn_tables::*;
use std::path::Path;
use std::sync::Arc;

fn results_table(tag: &str) -> Table {
    Table::from_rows(
        ["Node", "Pressure"],
        vec![
            vec![Value::from("Unit"), Value::from("barg")],
            vec![Value::from(tag), Value::from(12.0)],
        ],
    )
}

#[test]
fn write_then_read_back_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("Node_Results.json");
    let store = JsonWorkbookStore::new();

    assert!(!store.exists(&path));
    let name = store
        .write_sheet(&results_table("S1"), &path, "Base", CellRef::A2, true)
        .unwrap();
    assert_eq!(name, "Base");
    assert!(store.exists(&path));

    let back = store.read_sheet(&path, "Base").unwrap();
    assert_eq!(back, results_table("S1"));
    assert_eq!(store.sheet_names(&path).unwrap(), vec!["Base".to_string()]);
}

#[test]
fn missing_sheet_and_workbook_are_distinct_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.json");
    let store = JsonWorkbookStore::new();

    assert!(matches!(
        store.read_sheet(&path, "X"),
        Err(TableError::WorkbookNotFound { .. })
    ));
    store
        .write_sheet(&results_table("S1"), &path, "A", CellRef::A1, true)
        .unwrap();
    let err = store.read_sheet(&path, "X").unwrap_err();
    assert!(matches!(err, TableError::SheetNotFound { ref sheet, .. } if sheet == "X"));
    assert!(err.to_string().contains("book.json"));
}

#[test]
fn corrupt_workbook_reports_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = JsonWorkbookStore::new();
    assert!(matches!(
        store.read_sheet(&path, "A"),
        Err(TableError::Json { .. })
    ));
}

#[test]
fn long_sheet_names_are_truncated_on_write() {
    let store = MemoryWorkbookStore::new();
    let long = "Pipeline_Model_Late_Operation_2035_Case";
    let name = store
        .write_sheet(&results_table("S1"), Path::new("r.json"), long, CellRef::A2, true)
        .unwrap();
    assert_eq!(name.chars().count(), MAX_SHEET_NAME);
    assert!(store.read_sheet(Path::new("r.json"), &name).is_ok());
}

#[test]
fn concurrent_writers_keep_every_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = Arc::new(dir.path().join("shared.json"));
    let store = Arc::new(JsonWorkbookStore::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            let path = Arc::clone(&path);
            std::thread::spawn(move || {
                store
                    .write_sheet(
                        &results_table(&format!("S{i}")),
                        &path,
                        &format!("Case{i}"),
                        CellRef::A2,
                        true,
                    )
                    .unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let mut names = store.sheet_names(&path).unwrap();
    names.sort();
    assert_eq!(names.len(), 8);
    assert_eq!(names[0], "Case0");
}
