use std::sync::Arc;

use pulse_access::domain::ledger::Ledger;
use pulse_access::domain::types::{Code, UsageEventKind, ValidationResult};
use pulse_access::error::AccessServiceError;
use pulse_access::usecase::issuance::RequestCodeInput;
use pulse_access::usecase::ledger::CodeLedger;
use pulse_access::usecase::redemption::{RedeemCodeUseCase, ValidateCodeUseCase};

use crate::helpers::{MemoryLedgerStore, MockDelivery, issuer, memory_ledger};

fn ledger_of(codes: &[(&str, bool, bool)]) -> (Arc<CodeLedger<MemoryLedgerStore>>, MemoryLedgerStore) {
    let codes = codes
        .iter()
        .map(|&(v, issued, used)| Code {
            value: v.to_owned(),
            issued,
            used,
        })
        .collect();
    let store = MemoryLedgerStore::new(Ledger::from_parts(codes, vec![]).unwrap());
    (Arc::new(CodeLedger::new(store.clone())), store)
}

#[tokio::test]
async fn validate_is_valid_only_for_issued_unused_codes() {
    let (ledger, store) = ledger_of(&[("A1", false, false), ("B2", true, false), ("C3", true, true)]);
    let uc = ValidateCodeUseCase { ledger };

    assert_eq!(uc.execute("A1").await.unwrap(), ValidationResult::NotFound);
    assert_eq!(uc.execute("B2").await.unwrap(), ValidationResult::Valid);
    assert_eq!(uc.execute(" B2 ").await.unwrap(), ValidationResult::Valid);
    assert_eq!(uc.execute("C3").await.unwrap(), ValidationResult::AlreadyUsed);
    assert_eq!(uc.execute("Z9").await.unwrap(), ValidationResult::NotFound);
    assert_eq!(store.persist_count(), 0, "validate must not write");
}

#[tokio::test]
async fn second_redeem_fails_with_already_used() {
    let (ledger, store) = ledger_of(&[("A1", true, false)]);
    let uc = RedeemCodeUseCase { ledger };

    uc.execute("A1").await.unwrap();
    assert!(store.current().code("A1").unwrap().used);

    let again = uc.execute("A1").await;
    assert!(
        matches!(again, Err(AccessServiceError::CodeAlreadyUsed)),
        "expected CodeAlreadyUsed, got {again:?}"
    );
    assert_eq!(store.persist_count(), 1);
}

#[tokio::test]
async fn redeem_never_succeeds_on_unissued_or_unknown_code() {
    let (ledger, store) = ledger_of(&[("A1", false, false)]);
    let uc = RedeemCodeUseCase { ledger };

    for code in ["A1", "Z9"] {
        let result = uc.execute(code).await;
        assert!(
            matches!(result, Err(AccessServiceError::CodeNotFound)),
            "expected CodeNotFound for {code}, got {result:?}"
        );
    }
    let stored = store.current();
    assert!(!stored.code("A1").unwrap().used);
    assert!(!stored.code("A1").unwrap().issued);
    assert_eq!(store.persist_count(), 0);
}

#[tokio::test]
async fn redeem_with_keeps_code_unused_when_finalize_fails() {
    let (ledger, store) = ledger_of(&[("A1", true, false)]);
    let uc = RedeemCodeUseCase { ledger };

    let result = uc
        .execute_with("A1", UsageEventKind::VoteCast, async {
            Err(AccessServiceError::Internal(anyhow::anyhow!("append failed")))
        })
        .await;

    assert!(matches!(result, Err(AccessServiceError::Internal(_))));
    assert!(!store.current().code("A1").unwrap().used);
    assert_eq!(store.persist_count(), 0);
}

#[tokio::test]
async fn redeem_with_skips_finalize_for_used_code() {
    let (ledger, _store) = ledger_of(&[("A1", true, true)]);
    let uc = RedeemCodeUseCase { ledger };
    let mut ran = false;

    let result = uc
        .execute_with("A1", UsageEventKind::VoteCast, async {
            ran = true;
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(AccessServiceError::CodeAlreadyUsed)));
    assert!(!ran, "finalize must not run for a used code");
}

#[tokio::test]
async fn concurrent_redeems_of_one_code_yield_one_winner() {
    let (ledger, _store) = ledger_of(&[("A1", true, false)]);
    let uc = RedeemCodeUseCase { ledger };

    let (a, b) = tokio::join!(uc.execute("A1"), uc.execute("A1"));

    let ok = [&a, &b].iter().filter(|r| r.is_ok()).count();
    let used = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(AccessServiceError::CodeAlreadyUsed)))
        .count();
    assert_eq!((ok, used), (1, 1), "{a:?} / {b:?}");
}

#[tokio::test]
async fn end_to_end_issue_validate_redeem() {
    let (ledger, store) = memory_ledger(&["A1", "B2"]);
    let issue = issuer(&ledger, MockDelivery::new());
    let validate = ValidateCodeUseCase {
        ledger: Arc::clone(&ledger),
    };
    let redeem = RedeemCodeUseCase {
        ledger: Arc::clone(&ledger),
    };

    let code = issue
        .execute(RequestCodeInput {
            identity: "x@y.com".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(code.value, "A1");
    assert!(store.current().code("A1").unwrap().issued);

    assert_eq!(validate.execute("A1").await.unwrap(), ValidationResult::Valid);
    redeem.execute("A1").await.unwrap();
    assert_eq!(validate.execute("A1").await.unwrap(), ValidationResult::AlreadyUsed);
    assert_eq!(validate.execute("B2").await.unwrap(), ValidationResult::NotFound);
    assert_eq!(validate.execute("Z9").await.unwrap(), ValidationResult::NotFound);

    let kinds: Vec<UsageEventKind> = store.events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![UsageEventKind::CodeIssued, UsageEventKind::CodeRedeemed]);
}

#[tokio::test]
async fn redeem_logs_code_without_identity() {
    let (ledger, store) = ledger_of(&[("A1", true, false)]);
    let uc = RedeemCodeUseCase { ledger };

    uc.execute("A1").await.unwrap();
    assert!(uc.execute("A1").await.is_err());

    let events = store.events();
    assert_eq!(events.len(), 1, "{events:?}");
    assert_eq!(events[0].kind, UsageEventKind::CodeRedeemed);
    assert_eq!(events[0].code, "A1");
    assert!(events[0].identity.is_empty());
}
