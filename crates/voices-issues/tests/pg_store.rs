//! Postgres issue store against a live database.

use chrono::{Duration, TimeZone, Utc};
use voices_issues::{IssueStore, KeyIssues, Perspectives, PgIssueStore, Topic, ISSUES_TTL};

fn document() -> KeyIssues {
    KeyIssues {
        generated_at: Some(Utc.with_ymd_and_hms(2025, 6, 10, 6, 0, 0).unwrap()),
        topics: vec![Topic {
            id: "budget".to_string(),
            title: "Budget".to_string(),
            description: "Shutdown looms".to_string(),
            perspectives: Perspectives::default(),
        }],
        message: None,
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn stored_document_reads_back(pool: sqlx::PgPool) {
    let store = PgIssueStore::new(pool);
    assert_eq!(store.get().await.expect("empty get"), None);

    store.put(&document(), ISSUES_TTL).await.expect("put");

    assert_eq!(store.get().await.expect("get"), Some(document()));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn zero_ttl_is_rejected(pool: sqlx::PgPool) {
    let store = PgIssueStore::new(pool);
    assert!(store.put(&document(), Duration::zero()).await.is_err());
}
