//! Loan record and lifecycle
//!
//! A loan is a flat attribute set keyed by the names in the field schema.
//! `create` and `apply_update` sequence the two checks: structural
//! validation on creation, transition guard plus re-validation on update.
//! Both are pure apart from reading the clock and the acting user; on any
//! failure the existing record is untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::ActingUser;
use crate::clock::Clock;
use crate::schema::{self, FieldKind};

use super::transitions::{guard_update, TransitionError};
use super::validate::{validate, ValidationError};

/// Contract paperwork status. Strict forward path, no skipping or
/// reversing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractState {
    SentToLoaner,
    SignatureReceived,
    SignatureSent,
}

impl ContractState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractState::SentToLoaner => "sent_to_loaner",
            ContractState::SignatureReceived => "signature_received",
            ContractState::SignatureSent => "signature_sent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent_to_loaner" => Some(ContractState::SentToLoaner),
            "signature_received" => Some(ContractState::SignatureReceived),
            "signature_sent" => Some(ContractState::SignatureSent),
            _ => None,
        }
    }
}

/// Disbursement status. Only the loaned edge is reachable today; the
/// repaid value exists so its audit columns are provisioned for a future
/// edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanState {
    Loaned,
    Repaid,
}

impl LoanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanState::Loaned => "loaned",
            LoanState::Repaid => "repaid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "loaned" => Some(LoanState::Loaned),
            "repaid" => Some(LoanState::Repaid),
            _ => None,
        }
    }
}

/// Failure of a create or update attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Flat field-to-value mapping of one loan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanRecord(Map<String, Value>);

impl LoanRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }

    pub fn remove(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Wrap a raw attribute map without normalization. Used by the storage
    /// layer when rehydrating rows; request input goes through
    /// [`LoanRecord::normalize`] instead.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    #[cfg(test)]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => panic!("loan record literal must be an object"),
        }
    }

    /// State of a protected field, with absent, null and the empty string
    /// all reading as unset.
    pub fn state_value(&self, field: &str) -> Option<&str> {
        self.get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn contract_state(&self) -> Option<ContractState> {
        self.state_value("contract_state").and_then(ContractState::parse)
    }

    pub fn loan_state(&self) -> Option<LoanState> {
        self.state_value("loan_state").and_then(LoanState::parse)
    }

    /// Normalize a raw string-hash into a typed attribute map: unknown
    /// keys, nulls and empty strings are dropped; strings are coerced to
    /// numbers for integer and decimal fields, with a locale comma decimal
    /// separator accepted. Unparseable strings are kept as-is so
    /// validation can point at the precise field.
    pub fn normalize(raw: Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in raw {
            let Some(desc) = schema::field(&key) else {
                continue;
            };
            if value.is_null() || value.as_str().is_some_and(str::is_empty) {
                continue;
            }
            let coerced = match (desc.kind, &value) {
                (FieldKind::Integer { .. }, Value::String(s)) => {
                    s.trim().parse::<i64>().ok().map(Value::from)
                }
                (FieldKind::Decimal { .. }, Value::String(s)) => {
                    s.trim().replace(',', ".").parse::<f64>().ok().map(Value::from)
                }
                _ => None,
            };
            out.insert(key, coerced.unwrap_or(value));
        }
        out
    }

    /// Build a new loan from raw attributes: normalize, stamp
    /// `date_created`/`user_created` if absent, validate.
    pub fn create(
        raw: Map<String, Value>,
        acting_user: &dyn ActingUser,
        clock: &dyn Clock,
    ) -> Result<Self, ValidationError> {
        let mut attributes = Self::normalize(raw);
        attributes
            .entry("date_created".to_string())
            .or_insert_with(|| Value::String(clock.now_stamp()));
        attributes
            .entry("user_created".to_string())
            .or_insert_with(|| Value::String(acting_user.id().to_string()));
        let record = Self(attributes);
        validate(&record)?;
        Ok(record)
    }

    /// Apply a guarded update: normalize the requested changes, authorize
    /// them against the current record, merge the authorized set together
    /// with its derived audit stamps, re-validate the merged result.
    /// Returns the new record; `self` is never modified.
    pub fn apply_update(
        &self,
        changes: Map<String, Value>,
        acting_user: &dyn ActingUser,
        clock: &dyn Clock,
    ) -> Result<Self, LoanError> {
        let changes = Self::normalize(changes);
        let authorized = guard_update(self, &changes, acting_user, clock)?;
        let mut merged = self.clone();
        for (key, value) in authorized.into_map() {
            merged.0.insert(key, value);
        }
        validate(&merged)?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_coerces_numeric_strings() {
        let raw = json!({
            "value": "1000",
            "minimum_term": "12",
            "rate_of_interest": "2,5",
            "loaner_name": "Alice",
        });
        let Value::Object(raw) = raw else { unreachable!() };
        let normalized = LoanRecord::normalize(raw);
        assert_eq!(normalized["value"], json!(1000));
        assert_eq!(normalized["minimum_term"], json!(12));
        assert_eq!(normalized["rate_of_interest"], json!(2.5));
        assert_eq!(normalized["loaner_name"], json!("Alice"));
    }

    #[test]
    fn test_normalize_drops_empty_null_and_unknown() {
        let raw = json!({
            "value": 1000,
            "notes": "",
            "granted_until": null,
            "favorite_color": "green",
        });
        let Value::Object(raw) = raw else { unreachable!() };
        let normalized = LoanRecord::normalize(raw);
        assert_eq!(normalized.len(), 1);
        assert!(normalized.contains_key("value"));
    }

    #[test]
    fn test_normalize_keeps_unparseable_strings_for_diagnosis() {
        let raw = json!({ "value": "a lot" });
        let Value::Object(raw) = raw else { unreachable!() };
        let normalized = LoanRecord::normalize(raw);
        assert_eq!(normalized["value"], json!("a lot"));
    }

    #[test]
    fn test_state_value_treats_empty_as_unset() {
        let record = LoanRecord::from_value(json!({ "contract_state": "" }));
        assert_eq!(record.state_value("contract_state"), None);
        assert_eq!(record.contract_state(), None);

        let record = LoanRecord::from_value(json!({ "contract_state": "sent_to_loaner" }));
        assert_eq!(record.contract_state(), Some(ContractState::SentToLoaner));
    }

    #[test]
    fn test_state_round_trip() {
        for state in [
            ContractState::SentToLoaner,
            ContractState::SignatureReceived,
            ContractState::SignatureSent,
        ] {
            assert_eq!(ContractState::parse(state.as_str()), Some(state));
        }
        for state in [LoanState::Loaned, LoanState::Repaid] {
            assert_eq!(LoanState::parse(state.as_str()), Some(state));
        }
        assert_eq!(ContractState::parse("signed"), None);
    }
}
