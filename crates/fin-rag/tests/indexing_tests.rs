//! Index rebuild and QA chain behaviour with in-process providers.

mod common;

use std::sync::atomic::Ordering;

use common::{docx_bytes, harness, test_config, DIM};
use fin_rag::indexing::IndexBuilder;
use fin_rag::server::state::AppState;

#[tokio::test]
async fn test_rebuild_with_no_documents_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness();

    let builder = IndexBuilder::new(&test_config(dir.path()), harness.providers.clone());
    let chain = builder.rebuild().await.unwrap();

    assert!(chain.is_none());
    assert_eq!(harness.store.upserts.load(Ordering::SeqCst), 0);
    assert!(harness.store.ensured_dims.lock().is_none());
}

#[tokio::test]
async fn test_rebuild_indexes_every_document() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.docx"), docx_bytes(&["Revenue grew 6.8 percent."])).unwrap();
    std::fs::write(dir.path().join("b.docx"), docx_bytes(&["Headcount reached 601,546."])).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let harness = harness();
    let builder = IndexBuilder::new(&test_config(dir.path()), harness.providers.clone());
    let chain = builder.rebuild().await.unwrap().expect("chain");

    assert_eq!(chain.top_k(), 2);
    assert_eq!(*harness.store.ensured_dims.lock(), Some(DIM));
    assert_eq!(harness.store.len(), 2);
}

#[tokio::test]
async fn test_repeated_rebuilds_do_not_duplicate_chunks() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.docx"), docx_bytes(&["Free cash flow was 44,338 crore."])).unwrap();

    let harness = harness();
    let builder = IndexBuilder::new(&test_config(dir.path()), harness.providers.clone());

    builder.rebuild().await.unwrap();
    let after_first = harness.store.len();
    builder.rebuild().await.unwrap();

    assert_eq!(harness.store.len(), after_first);
    assert_eq!(harness.store.upserts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_chain_retrieves_at_most_top_k() {
    let dir = tempfile::tempdir().unwrap();
    for (name, text) in [
        ("a.docx", "Revenue increased strongly."),
        ("b.docx", "Attrition fell to 12.5 percent."),
        ("c.docx", "Dividends totalled 73 rupees per share."),
    ] {
        std::fs::write(dir.path().join(name), docx_bytes(&[text])).unwrap();
    }

    let harness = harness();
    let builder = IndexBuilder::new(&test_config(dir.path()), harness.providers.clone());
    let chain = builder.rebuild().await.unwrap().expect("chain");

    let results = chain.retrieve("How did revenue change?").await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].similarity >= results[1].similarity);

    let answer = chain.invoke("How did revenue change?").await.unwrap();
    assert!(answer.starts_with("**Answer:** "));
    let prompt = harness.llm.prompts.lock().last().cloned().unwrap();
    let included = [
        "Revenue increased strongly.",
        "Attrition fell to 12.5 percent.",
        "Dividends totalled 73 rupees per share.",
    ]
    .iter()
    .filter(|text| prompt.contains(*text))
    .count();
    assert_eq!(included, 2);
}

#[tokio::test]
async fn test_failed_rebuild_keeps_previous_chain() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.docx"), docx_bytes(&["EPS was 125.88 rupees."])).unwrap();

    let harness = harness();
    let state = AppState::with_providers(test_config(dir.path()), harness.providers.clone()).unwrap();

    assert!(state.rebuild_index().await.unwrap());
    let first = state.current_chain().expect("chain");

    // Emptying the directory leaves nothing to index; the old chain stays
    std::fs::remove_file(dir.path().join("a.docx")).unwrap();
    assert!(!state.rebuild_index().await.unwrap());

    let current = state.current_chain().expect("chain");
    assert!(std::sync::Arc::ptr_eq(&first, &current));
}

#[tokio::test]
async fn test_concurrent_rebuilds_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.docx"), docx_bytes(&["Order book stood at 42.7 billion."])).unwrap();

    let harness = harness();
    let state = AppState::with_providers(test_config(dir.path()), harness.providers.clone()).unwrap();

    let (a, b) = tokio::join!(state.rebuild_index(), state.rebuild_index());
    tokio_test::assert_ok!(a);
    tokio_test::assert_ok!(b);

    assert!(state.has_index());
    assert_eq!(harness.store.upserts.load(Ordering::SeqCst), 2);
    assert_eq!(harness.store.max_in_flight.load(Ordering::SeqCst), 1);
}
