//! Transition guard for the protected state fields
//!
//! After creation a loan only ever changes through its two state axes,
//! `contract_state` and `loan_state`. The guard authorizes a requested
//! change set against the stored record: every other field is rejected,
//! each state edge must be the next step of its fixed forward path, some
//! edges require a capability, and each authorized edge derives its
//! `date_*`/`user_*` audit pair. Any single disallowed change aborts the
//! whole update before anything is emitted.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::{ActingUser, Capability};
use crate::clock::Clock;
use crate::schema;

use super::model::{ContractState, LoanRecord, LoanState};

/// Rejection of an update attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The caller tried to change a field outside the protected set.
    #[error("field `{0}` is not updatable")]
    FieldNotUpdatable(String),

    /// Disallowed state edge, unknown state value, or missing capability.
    #[error("transition of `{field}` from {} to `{to}` is not authorized",
            .from.as_deref().map(|f| format!("`{f}`")).unwrap_or_else(|| "unset".to_string()))]
    NotAuthorized {
        field: &'static str,
        from: Option<String>,
        to: String,
    },
}

impl TransitionError {
    fn not_authorized(field: &'static str, from: Option<&str>, to: &str) -> Self {
        TransitionError::NotAuthorized {
            field,
            from: from.map(str::to_string),
            to: to.to_string(),
        }
    }
}

/// The changes an update is allowed to merge: the new protected values
/// plus the audit stamps derived for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizedChanges(Map<String, Value>);

impl AuthorizedChanges {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Requested value of a protected field, read with the same unset
/// semantics as the stored side.
fn requested_state(changes: &Map<String, Value>, field: &str) -> Option<String> {
    changes
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Capability needed for a contract paperwork edge, or an error if the
/// pair of states is not an edge of the forward path.
fn contract_edge(
    from: Option<ContractState>,
    to: ContractState,
) -> Result<Option<Capability>, ()> {
    match (from, to) {
        (None, ContractState::SentToLoaner) => Ok(None),
        (Some(ContractState::SentToLoaner), ContractState::SignatureReceived)
        | (Some(ContractState::SignatureReceived), ContractState::SignatureSent) => {
            Ok(Some(Capability::ReceiveSignedContracts))
        }
        _ => Err(()),
    }
}

fn loan_edge(from: Option<LoanState>, to: LoanState) -> Result<Option<Capability>, ()> {
    match (from, to) {
        (None, LoanState::Loaned) => Ok(Some(Capability::ReceiveLoans)),
        _ => Err(()),
    }
}

/// Stamp the audit pair for an authorized edge: the event name combines
/// the field prefix (`contract`/`loan`) with the new state value.
fn stamp_audit(
    out: &mut Map<String, Value>,
    field: &str,
    new_value: &str,
    acting_user: &dyn ActingUser,
    clock: &dyn Clock,
) {
    let prefix = field.split('_').next().unwrap_or(field);
    let event = format!("{prefix}_{new_value}");
    out.insert(format!("date_{event}"), Value::String(clock.now_stamp()));
    out.insert(
        format!("user_{event}"),
        Value::String(acting_user.id().to_string()),
    );
}

/// Authorize a requested change set against the stored record.
///
/// Values identical to the stored ones are dropped as no-ops first; a
/// resubmitted current value is not a transition attempt. Everything that
/// remains must be a protected field moving along an allowed edge, with
/// the acting user holding the edge's capability where one is required.
pub fn guard_update(
    previous: &LoanRecord,
    changes: &Map<String, Value>,
    acting_user: &dyn ActingUser,
    clock: &dyn Clock,
) -> Result<AuthorizedChanges, TransitionError> {
    let mut changed = Map::new();
    for (key, value) in changes {
        if previous.get(key) != Some(value) {
            changed.insert(key.clone(), value.clone());
        }
    }

    for key in changed.keys() {
        if !schema::is_protected(key) {
            return Err(TransitionError::FieldNotUpdatable(key.clone()));
        }
    }

    let mut authorized = Map::new();

    if let Some(requested) = requested_state(&changed, "contract_state") {
        let from = previous.contract_state();
        let edge = ContractState::parse(&requested)
            .ok_or(())
            .and_then(|to| contract_edge(from, to))
            .map_err(|()| {
                TransitionError::not_authorized(
                    "contract_state",
                    previous.state_value("contract_state"),
                    &requested,
                )
            })?;
        if let Some(capability) = edge {
            if !acting_user.can(capability) {
                return Err(TransitionError::not_authorized(
                    "contract_state",
                    previous.state_value("contract_state"),
                    &requested,
                ));
            }
        }
        authorized.insert("contract_state".to_string(), Value::String(requested.clone()));
        stamp_audit(&mut authorized, "contract_state", &requested, acting_user, clock);
    } else if changed.contains_key("contract_state") {
        // present but null/empty: clearing a state is not an edge
        return Err(TransitionError::not_authorized(
            "contract_state",
            previous.state_value("contract_state"),
            "",
        ));
    }

    if let Some(requested) = requested_state(&changed, "loan_state") {
        let from = previous.loan_state();
        let edge = LoanState::parse(&requested)
            .ok_or(())
            .and_then(|to| loan_edge(from, to))
            .map_err(|()| {
                TransitionError::not_authorized(
                    "loan_state",
                    previous.state_value("loan_state"),
                    &requested,
                )
            })?;
        if let Some(capability) = edge {
            if !acting_user.can(capability) {
                return Err(TransitionError::not_authorized(
                    "loan_state",
                    previous.state_value("loan_state"),
                    &requested,
                ));
            }
        }
        authorized.insert("loan_state".to_string(), Value::String(requested.clone()));
        stamp_audit(&mut authorized, "loan_state", &requested, acting_user, clock);
    } else if changed.contains_key("loan_state") {
        return Err(TransitionError::not_authorized(
            "loan_state",
            previous.state_value("loan_state"),
            "",
        ));
    }

    Ok(AuthorizedChanges(authorized))
}
