//! Loan Lifecycle Tests
//!
//! These tests exercise the pure core end to end: creation with
//! normalization and validation, the guarded state transitions on both
//! axes, capability gating, audit stamping, and the all-or-nothing
//! update contract.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};

use loanbook_server::auth::{ActingUser, Capability};
use loanbook_server::clock::Clock;
use loanbook_server::loan::{validate, LoanError, LoanRecord, TransitionError, ValidationCode};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

struct StubUser {
    id: &'static str,
    capabilities: Vec<Capability>,
}

impl ActingUser for StubUser {
    fn id(&self) -> &str {
        self.id
    }

    fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
}

fn clerk() -> StubUser {
    StubUser {
        id: "clerk-1",
        capabilities: vec![],
    }
}

fn back_office() -> StubUser {
    StubUser {
        id: "back-office",
        capabilities: vec![Capability::ReceiveSignedContracts, Capability::ReceiveLoans],
    }
}

fn attrs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn new_loan() -> LoanRecord {
    LoanRecord::create(
        attrs(json!({
            "value": 1000,
            "minimum_term": 12,
            "cancelation_period": 3,
            "rate_of_interest": "2,5",
            "loaner_name": "Alice",
            "loaner_address": "Street 1",
        })),
        &clerk(),
        &clock(),
    )
    .unwrap()
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_create_normalizes_and_stamps() {
    let loan = new_loan();
    assert_eq!(loan.get("rate_of_interest"), Some(&json!(2.5)));
    assert_eq!(
        loan.get("date_created"),
        Some(&json!("2024-03-01T12:30:00.000Z"))
    );
    assert_eq!(loan.get("user_created"), Some(&json!("clerk-1")));
}

#[test]
fn test_create_keeps_explicit_creation_stamp() {
    let loan = LoanRecord::create(
        attrs(json!({
            "value": 500,
            "granted_until": "2025-06-30",
            "rate_of_interest": 0,
            "loaner_name": "Bob",
            "loaner_address": "Street 2",
            "date_created": "2023-01-01T00:00:00Z",
            "user_created": "importer",
        })),
        &clerk(),
        &clock(),
    )
    .unwrap();
    assert_eq!(
        loan.get("date_created"),
        Some(&json!("2023-01-01T00:00:00Z"))
    );
    assert_eq!(loan.get("user_created"), Some(&json!("importer")));
}

#[test]
fn test_create_output_always_revalidates_clean() {
    let loan = new_loan();
    assert_eq!(validate(&loan), Ok(()));
}

#[test]
fn test_create_rejects_incomplete_term_pair() {
    let result = LoanRecord::create(
        attrs(json!({
            "value": 1000,
            "minimum_term": 12,
            "rate_of_interest": "2,5",
            "loaner_name": "Alice",
            "loaner_address": "Street 1",
        })),
        &clerk(),
        &clock(),
    );
    assert_eq!(result.unwrap_err().code, ValidationCode::TermPairIncomplete);
}

#[test]
fn test_create_rejects_string_hash_garbage_with_field_diagnosis() {
    let result = LoanRecord::create(
        attrs(json!({
            "value": "plenty",
            "minimum_term": 12,
            "cancelation_period": 3,
            "rate_of_interest": "2,5",
            "loaner_name": "Alice",
            "loaner_address": "Street 1",
        })),
        &clerk(),
        &clock(),
    );
    let err = result.unwrap_err();
    assert_eq!(err.field, Some("value"));
    assert_eq!(err.code, ValidationCode::NotAnInteger);
}

// ============================================================================
// Contract state axis
// ============================================================================

#[test]
fn test_full_contract_paperwork_path() {
    let loan = new_loan();

    let loan = loan
        .apply_update(
            attrs(json!({ "contract_state": "sent_to_loaner" })),
            &clerk(),
            &clock(),
        )
        .unwrap();
    assert_eq!(
        loan.get("contract_state"),
        Some(&json!("sent_to_loaner"))
    );
    assert_eq!(
        loan.get("date_contract_sent_to_loaner"),
        Some(&json!("2024-03-01T12:30:00.000Z"))
    );
    assert_eq!(
        loan.get("user_contract_sent_to_loaner"),
        Some(&json!("clerk-1"))
    );

    let later = FixedClock(Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap());
    let loan = loan
        .apply_update(
            attrs(json!({ "contract_state": "signature_received" })),
            &back_office(),
            &later,
        )
        .unwrap();
    assert_eq!(
        loan.get("date_contract_signature_received"),
        Some(&json!("2024-03-05T09:00:00.000Z"))
    );
    assert_eq!(
        loan.get("user_contract_signature_received"),
        Some(&json!("back-office"))
    );

    let loan = loan
        .apply_update(
            attrs(json!({ "contract_state": "signature_sent" })),
            &back_office(),
            &later,
        )
        .unwrap();
    assert_eq!(
        loan.get("contract_state"),
        Some(&json!("signature_sent"))
    );
    // earlier stamps survive later transitions
    assert_eq!(
        loan.get("date_contract_sent_to_loaner"),
        Some(&json!("2024-03-01T12:30:00.000Z"))
    );
}

#[test]
fn test_signature_received_denied_without_capability() {
    let loan = new_loan()
        .apply_update(
            attrs(json!({ "contract_state": "sent_to_loaner" })),
            &clerk(),
            &clock(),
        )
        .unwrap();
    let result = loan.apply_update(
        attrs(json!({ "contract_state": "signature_received" })),
        &clerk(),
        &clock(),
    );
    assert!(matches!(
        result,
        Err(LoanError::Transition(TransitionError::NotAuthorized {
            field: "contract_state",
            ..
        }))
    ));
}

#[test]
fn test_contract_state_cannot_skip_or_reverse() {
    let loan = new_loan();
    assert!(loan
        .apply_update(
            attrs(json!({ "contract_state": "signature_received" })),
            &back_office(),
            &clock(),
        )
        .is_err());

    let sent = loan
        .apply_update(
            attrs(json!({ "contract_state": "sent_to_loaner" })),
            &clerk(),
            &clock(),
        )
        .unwrap();
    assert!(sent
        .apply_update(
            attrs(json!({ "contract_state": "signature_sent" })),
            &back_office(),
            &clock(),
        )
        .is_err());
}

// ============================================================================
// Loan state axis
// ============================================================================

#[test]
fn test_loan_state_requires_receive_loans() {
    let loan = new_loan();
    assert!(loan
        .apply_update(attrs(json!({ "loan_state": "loaned" })), &clerk(), &clock())
        .is_err());

    let loaned = loan
        .apply_update(
            attrs(json!({ "loan_state": "loaned" })),
            &back_office(),
            &clock(),
        )
        .unwrap();
    assert_eq!(loaned.get("loan_state"), Some(&json!("loaned")));
    assert_eq!(
        loaned.get("date_loan_loaned"),
        Some(&json!("2024-03-01T12:30:00.000Z"))
    );
    assert_eq!(loaned.get("user_loan_loaned"), Some(&json!("back-office")));
}

#[test]
fn test_loan_state_axis_is_independent_of_contract_axis() {
    // disbursement may be recorded before any paperwork has moved
    let loan = new_loan()
        .apply_update(
            attrs(json!({ "loan_state": "loaned" })),
            &back_office(),
            &clock(),
        )
        .unwrap();
    assert_eq!(loan.get("contract_state"), None);
}

// ============================================================================
// Update contract: all-or-nothing, no-ops, locked fields
// ============================================================================

#[test]
fn test_non_protected_fields_locked_after_creation() {
    let loan = new_loan();
    let result = loan.apply_update(
        attrs(json!({ "loaner_name": "Mallory" })),
        &back_office(),
        &clock(),
    );
    assert!(matches!(
        result,
        Err(LoanError::Transition(TransitionError::FieldNotUpdatable(field))) if field == "loaner_name"
    ));
}

#[test]
fn test_disallowed_change_aborts_the_allowed_one() {
    let loan = new_loan();
    let result = loan.apply_update(
        attrs(json!({
            "contract_state": "sent_to_loaner",
            "notes": "also this",
        })),
        &back_office(),
        &clock(),
    );
    assert!(result.is_err());
    // original record untouched by the failed attempt
    assert_eq!(loan.get("contract_state"), None);
    assert_eq!(loan.get("notes"), None);
}

#[test]
fn test_resubmitted_values_do_not_count_as_changes() {
    let loan = new_loan()
        .apply_update(
            attrs(json!({ "contract_state": "sent_to_loaner" })),
            &clerk(),
            &clock(),
        )
        .unwrap();
    // same state plus an identical non-protected value: a no-op, not a
    // transition attempt, and allowed for a user with no capabilities
    let unchanged = loan
        .apply_update(
            attrs(json!({
                "contract_state": "sent_to_loaner",
                "loaner_name": "Alice",
            })),
            &clerk(),
            &clock(),
        )
        .unwrap();
    assert_eq!(unchanged, loan);
}

#[test]
fn test_update_keeps_term_specification_invariant() {
    // a state transition never disturbs the term fields, so the merged
    // record still validates
    let loan = new_loan()
        .apply_update(
            attrs(json!({ "contract_state": "sent_to_loaner" })),
            &clerk(),
            &clock(),
        )
        .unwrap();
    assert_eq!(validate(&loan), Ok(()));
    assert_eq!(loan.get("minimum_term"), Some(&json!(12)));
    assert_eq!(loan.get("cancelation_period"), Some(&json!(3)));
}
