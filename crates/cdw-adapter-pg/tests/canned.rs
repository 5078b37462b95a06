//! Canned queries run through the gateway against the in-memory warehouse.

use cdw_adapter_pg::{ExecutionGateway, MemoryConnector};
use cdw_core::LimitsConfig;
use cdw_query::{DateRange, PatientEntity, QueryConstructor};
use std::sync::Arc;

#[tokio::test]
async fn test_every_patient_intent_passes_the_gateway() {
    let connector = MemoryConnector::new().with_rows(
        "PatientDurableKey",
        ["PatientDurableKey", "DateKey"],
        vec![vec![Some("77".to_string()), Some("20240101".to_string())]],
    );
    let gateway = ExecutionGateway::new(Arc::new(connector.clone()));
    let constructor = QueryConstructor::new(LimitsConfig::default());

    for entity in PatientEntity::ALL {
        let spec = constructor
            .patient_query(entity, "77", DateRange::unbounded(), Some(25), None)
            .unwrap();
        let result = gateway.execute(&spec).await.unwrap();
        assert_eq!(result.row_count(), 1);
    }

    assert_eq!(connector.opened(), PatientEntity::ALL.len());
    assert_eq!(connector.closed(), PatientEntity::ALL.len());
    for sql in connector.executed() {
        assert!(sql.contains("\"PatientDurableKey\" = '77'"), "{sql}");
        assert!(sql.ends_with("LIMIT 25"), "{sql}");
    }
}

#[tokio::test]
async fn test_note_keyword_with_denied_word_is_rejected() {
    // Canned statements pass the same validator as caller SQL, so a keyword
    // that is itself a deny-listed word is refused.
    let connector = MemoryConnector::new();
    let gateway = ExecutionGateway::new(Arc::new(connector.clone()));
    let spec = QueryConstructor::default()
        .search_notes("77", "update", None)
        .unwrap();

    assert!(gateway.execute(&spec).await.is_err());
    assert_eq!(connector.opened(), 0);
}
