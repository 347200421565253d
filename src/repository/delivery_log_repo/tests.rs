use super::queries::clamp_limit;
use super::{DeliveryLedger, DeliveryLogRepository};
use crate::domain::delivery::{DeliveryLogFilter, MAX_LOG_LIST_LIMIT};
use crate::domain::types::DeliveryOutcome;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

#[test]
fn test_insert_sent_and_exists() {
    let repo = DeliveryLogRepository::new(setup_test_db());

    assert!(!repo.exists_sent("Oktober 2025", "budi@x.id").unwrap());
    let entry = repo
        .insert_sent("Oktober 2025", "Budi@X.id ", Some("Budi"), Some("PT Contoh"))
        .unwrap();

    assert_eq!(entry.email, "budi@x.id");
    assert_eq!(entry.outcome, DeliveryOutcome::Sent);
    assert!(repo.exists_sent("Oktober 2025", "budi@x.id").unwrap());
    assert!(repo.exists_sent("Oktober 2025", "BUDI@x.id").unwrap());
    assert!(!repo.exists_sent("November 2025", "budi@x.id").unwrap());
}

#[test]
fn test_second_sent_is_conflict() {
    let repo = DeliveryLogRepository::new(setup_test_db());

    repo.insert_sent("Okt", "a@x.id", None, None).unwrap();
    let err = repo.insert_sent("Okt", "a@x.id", None, None).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn test_failed_entries_do_not_block_sent() {
    let repo = DeliveryLogRepository::new(setup_test_db());

    repo.insert_failed("Okt", "a@x.id", Some("A"), Some("PT"), "timeout").unwrap();
    repo.insert_failed("Okt", "a@x.id", Some("A"), Some("PT"), "timeout").unwrap();
    assert!(!repo.exists_sent("Okt", "a@x.id").unwrap());

    repo.insert_sent("Okt", "a@x.id", Some("A"), Some("PT")).unwrap();
    assert_eq!(repo.count_by_period("Okt").unwrap(), (1, 2));
}

#[test]
fn test_find_newest_first_with_filters() {
    let repo = DeliveryLogRepository::new(setup_test_db());

    repo.insert_sent("Okt", "a@x.id", Some("A"), None).unwrap();
    repo.insert_failed("Okt", "b@x.id", Some("B"), None, "boom").unwrap();
    repo.insert_sent("Nov", "a@x.id", Some("A"), None).unwrap();

    let all = repo.find(&DeliveryLogFilter::default(), 10).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].period, "Nov");
    assert_eq!(all[2].email, "a@x.id");
    assert_eq!(all[2].period, "Okt");

    let okt_sent = repo
        .find(&DeliveryLogFilter::for_period("Okt").with_outcome(DeliveryOutcome::Sent), 10)
        .unwrap();
    assert_eq!(okt_sent.len(), 1);
    assert_eq!(okt_sent[0].employee_name.as_deref(), Some("A"));
    assert_eq!(okt_sent[0].organization_name, None);

    let by_email = repo
        .find(
            &DeliveryLogFilter {
                email: Some("B@x.id".into()),
                ..Default::default()
            },
            10,
        )
        .unwrap();
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0].error_message.as_deref(), Some("boom"));

    let limited = repo.find(&DeliveryLogFilter::default(), 1).unwrap();
    assert_eq!(limited.len(), 1);
}

#[test]
fn test_clamp_limit() {
    assert_eq!(clamp_limit(0), MAX_LOG_LIST_LIMIT);
    assert_eq!(clamp_limit(10), 10);
    assert_eq!(clamp_limit(10_000), MAX_LOG_LIST_LIMIT);
}

#[tokio::test]
async fn test_ledger_trait_delegates() {
    let repo = DeliveryLogRepository::new(setup_test_db());
    let ledger: &dyn DeliveryLedger = &repo;

    ledger.record_sent("Okt", "a@x.id", Some("A"), Some("PT")).await.unwrap();
    assert!(ledger.exists("Okt", "a@x.id").await.unwrap());
    assert!(ledger
        .record_sent("Okt", "a@x.id", Some("A"), Some("PT"))
        .await
        .unwrap_err()
        .is_conflict());

    ledger
        .record_failed("Okt", "b@x.id", None, None, "attachment not found")
        .await
        .unwrap();
    let entries = ledger.list(&DeliveryLogFilter::for_period("Okt"), 0).await.unwrap();
    assert_eq!(entries.len(), 2);
}
