use pretty_assertions::assert_eq;
use study_ai::corpus::{chunk_words, Chunk, VectorTable};
use study_core::error::codes;

fn chunks(texts: &[&str]) -> Vec<Chunk> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| Chunk {
            text: t.to_string(),
            index: i as u32,
            source: "doc.txt".to_string(),
        })
        .collect()
}

#[test]
fn first_write_creates_then_appends() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = VectorTable::open(dir.path().to_path_buf(), "book_chunks").expect("open");
    assert!(!table.exists());

    let first = table
        .store(&chunks(&["alpha", "beta"]), &[vec![1.0, 0.0], vec![0.0, 1.0]])
        .expect("store");
    assert!(first.created);
    assert_eq!(first.rows_written, 2);
    assert_eq!(first.dims, Some(2));

    let second = table
        .store(&chunks(&["gamma"]), &[vec![1.0, 1.0]])
        .expect("append");
    assert!(!second.created);

    let schema = table.schema().expect("schema").expect("exists");
    assert_eq!(schema.dims, 2);
    assert_eq!(schema.row_count, 3);

    let rows = table.rows().expect("rows");
    assert_eq!(
        rows.iter().map(|r| r.row_id).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(rows[2].text, "gamma");
    assert_eq!(rows[2].text_sha256.len(), 64);

    let reopened = VectorTable::open(dir.path().to_path_buf(), "book_chunks").expect("reopen");
    assert_eq!(reopened.rows().expect("rows").len(), 3);
}

#[test]
fn count_and_width_mismatches_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = VectorTable::open(dir.path().to_path_buf(), "t").expect("open");

    let err = table
        .store(&chunks(&["a", "b"]), &[vec![1.0, 0.0]])
        .unwrap_err();
    assert_eq!(err.code, codes::INDEX_DIMENSION_MISMATCH);
    assert!(!table.exists());

    table.store(&chunks(&["a"]), &[vec![1.0, 0.0]]).expect("store");
    let err = table
        .store(&chunks(&["b"]), &[vec![1.0, 0.0, 0.0]])
        .unwrap_err();
    assert_eq!(err.code, codes::INDEX_DIMENSION_MISMATCH);
    assert_eq!(table.rows().expect("rows").len(), 1);

    let err = table
        .store(&chunks(&["c", "d"]), &[vec![1.0, 0.0], vec![1.0]])
        .unwrap_err();
    assert_eq!(err.code, codes::INDEX_DIMENSION_MISMATCH);
}

#[test]
fn search_orders_by_distance_with_row_id_tie_break() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = VectorTable::open(dir.path().to_path_buf(), "t").expect("open");
    table
        .store(
            &chunks(&["far", "tie-a", "near", "tie-b", "zero"]),
            &[
                vec![0.0, 1.0],
                vec![1.0, 1.0],
                vec![1.0, 0.1],
                vec![1.0, 1.0],
                vec![0.0, 0.0],
            ],
        )
        .expect("store");

    let hits = table.search(&[1.0, 0.0], 10).expect("search");
    let texts: Vec<&str> = hits.iter().map(|h| h.chunk.text.as_str()).collect();
    assert_eq!(texts, vec!["near", "tie-a", "tie-b", "far"]);
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

    let top2 = table.search(&[1.0, 0.0], 2).expect("search");
    assert_eq!(top2.len(), 2);
    assert_eq!(top2[0].chunk.text, "near");
}

#[test]
fn search_on_missing_table_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = VectorTable::open(dir.path().to_path_buf(), "absent").expect("open");
    let err = table.search(&[1.0], 3).unwrap_err();
    assert_eq!(err.code, codes::INDEX_TABLE_NOT_FOUND);
}

#[test]
fn table_names_cannot_escape_db_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in ["", "../up", "a/b", ".hidden"] {
        let err = VectorTable::open(dir.path().to_path_buf(), name).unwrap_err();
        assert_eq!(err.code, codes::CONFIG_INVALID, "name={name:?}");
    }
}

#[test]
fn chunked_document_round_trips_through_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = VectorTable::open(dir.path().to_path_buf(), "t").expect("open");
    let text = (0..25).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    let cs = chunk_words(&text, 10, 2, "doc.txt").expect("chunk");
    let vectors: Vec<Vec<f32>> = cs.iter().map(|c| vec![1.0, c.index as f32]).collect();
    table.store(&cs, &vectors).expect("store");
    let back: Vec<Chunk> = table.rows().expect("rows").iter().map(|r| r.to_chunk()).collect();
    assert_eq!(back, cs);
}
