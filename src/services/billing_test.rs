use super::*;
use crate::store::{EntitlementStore, MemoryStore, PrincipalSnapshot};

fn seeded() -> (MemoryStore, Uuid) {
    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    store.insert_principal(PrincipalSnapshot {
        id,
        plan: Plan::Free,
        credits: 0,
        free_generations_used: 3,
        free_generations_limit: 3,
        is_admin: false,
        banned: false,
    });
    (store, id)
}

fn purchase(id: Uuid, event_id: &str, plan: Plan, credit_grant: i64) -> PaymentEvent {
    PaymentEvent {
        event_id: event_id.to_owned(),
        principal_id: id,
        kind: PaymentKind::Purchase,
        plan,
        credit_grant,
    }
}

// =============================================================================
// APPLICATION
// =============================================================================

#[tokio::test]
async fn purchase_sets_plan_and_grants_credits() {
    let (store, id) = seeded();

    let outcome = apply_payment_event(&store, &purchase(id, "evt_1", Plan::Professional, 100))
        .await
        .unwrap();
    assert_eq!(outcome, BillingOutcome::Applied { new_balance: 100 });

    let snapshot = store.load_snapshot(id).await.unwrap().unwrap();
    assert_eq!(snapshot.plan, Plan::Professional);
    assert_eq!(snapshot.credits, 100);
}

#[tokio::test]
async fn renewal_adds_to_existing_balance() {
    let (store, id) = seeded();
    apply_payment_event(&store, &purchase(id, "evt_1", Plan::Basic, 50)).await.unwrap();

    let renewal = PaymentEvent {
        event_id: "evt_2".into(),
        principal_id: id,
        kind: PaymentKind::Renewal,
        plan: Plan::Basic,
        credit_grant: 50,
    };
    let outcome = apply_payment_event(&store, &renewal).await.unwrap();
    assert_eq!(outcome, BillingOutcome::Applied { new_balance: 100 });
}

#[tokio::test]
async fn cancellation_resets_plan_and_balance_to_floor() {
    let (store, id) = seeded();
    apply_payment_event(&store, &purchase(id, "evt_1", Plan::Enterprise, 500)).await.unwrap();

    let cancellation = PaymentEvent {
        event_id: "evt_2".into(),
        principal_id: id,
        kind: PaymentKind::Cancellation,
        plan: Plan::Enterprise,
        credit_grant: 0,
    };
    let outcome = apply_payment_event(&store, &cancellation).await.unwrap();
    assert_eq!(outcome, BillingOutcome::Applied { new_balance: 0 });

    let snapshot = store.load_snapshot(id).await.unwrap().unwrap();
    assert_eq!(snapshot.plan, Plan::Free);
    assert_eq!(snapshot.credits, 0);
}

// =============================================================================
// IDEMPOTENCY
// =============================================================================

#[tokio::test]
async fn replayed_event_is_a_no_op() {
    let (store, id) = seeded();
    let event = purchase(id, "evt_1", Plan::Professional, 100);

    apply_payment_event(&store, &event).await.unwrap();
    let replay = apply_payment_event(&store, &event).await.unwrap();
    assert_eq!(replay, BillingOutcome::Duplicate);

    // Balance unchanged by the replay.
    let snapshot = store.load_snapshot(id).await.unwrap().unwrap();
    assert_eq!(snapshot.credits, 100);
}

#[tokio::test]
async fn distinct_events_both_apply() {
    let (store, id) = seeded();
    apply_payment_event(&store, &purchase(id, "evt_1", Plan::Basic, 50)).await.unwrap();
    apply_payment_event(&store, &purchase(id, "evt_2", Plan::Basic, 50)).await.unwrap();

    let snapshot = store.load_snapshot(id).await.unwrap().unwrap();
    assert_eq!(snapshot.credits, 100);
}

// =============================================================================
// VALIDATION
// =============================================================================

#[tokio::test]
async fn negative_grant_is_rejected_before_any_claim() {
    let (store, id) = seeded();
    let event = purchase(id, "evt_1", Plan::Basic, -5);

    assert!(matches!(
        apply_payment_event(&store, &event).await,
        Err(BillingError::InvalidGrant(-5))
    ));
    // The event id was never claimed, so a corrected retry can apply.
    assert!(store.record_billing_event("evt_1").await.unwrap());
}

// =============================================================================
// SIGNATURES
// =============================================================================

#[test]
fn signature_round_trips() {
    let body = br#"{"event_id":"evt_1"}"#;
    let sig = expected_signature("topsecret", body);
    assert!(verify_signature("topsecret", body, &sig));
    assert!(verify_signature("topsecret", body, &sig.to_ascii_uppercase()));
}

#[test]
fn signature_rejects_wrong_secret_or_body() {
    let body = br#"{"event_id":"evt_1"}"#;
    let sig = expected_signature("topsecret", body);
    assert!(!verify_signature("other", body, &sig));
    assert!(!verify_signature("topsecret", br#"{"event_id":"evt_2"}"#, &sig));
}

#[test]
fn signature_rejects_truncated_and_padded_digests() {
    let body = br#"{"event_id":"evt_1"}"#;
    let sig = expected_signature("topsecret", body);
    assert!(!verify_signature("topsecret", body, &sig[..sig.len() - 1]));
    assert!(!verify_signature("topsecret", body, &format!("{sig}00")));
    assert!(!verify_signature("topsecret", body, ""));
}

#[test]
fn byte_compare_requires_full_match() {
    assert!(constant_time_eq(b"abcd", b"abcd"));
    assert!(!constant_time_eq(b"abcd", b"abce"));
    assert!(!constant_time_eq(b"abcd", b"xbcd"));
    assert!(!constant_time_eq(b"abcd", b"abc"));
    assert!(constant_time_eq(b"", b""));
}
