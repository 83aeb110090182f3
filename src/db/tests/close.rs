use crate::db::*;
use crate::test_helpers::sample_record;
use tempfile::NamedTempFile;

/// Verify that listing identifiers after closing the pool returns an error
/// rather than hanging or panicking.
#[tokio::test]
async fn test_list_entry_ids_after_pool_close_returns_error() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.pool().close().await;

    let result = db.list_entry_ids().await;
    assert!(
        result.is_err(),
        "list_entry_ids after pool close should return an error, got: {:?}",
        result
    );
}

/// Verify that a market-data update after closing the pool returns an error
#[tokio::test]
async fn test_update_market_data_after_pool_close_returns_error() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.pool().close().await;

    let result = db.update_market_data(&sample_record("bitcoin")).await;
    match result {
        Err(crate::Error::Database(crate::error::DatabaseError::QueryFailed(msg))) => {
            assert!(msg.contains("bitcoin"), "error should name the entry: {msg}");
        }
        other => panic!("expected QueryFailed, got {other:?}"),
    }
}
