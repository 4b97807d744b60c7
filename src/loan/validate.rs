//! Structural and conditional validation of a loan attribute set
//!
//! Pure check over a candidate [`LoanRecord`]: required presence, per-field
//! type and format from the descriptor table, then the mutually-exclusive
//! term-specification rule. Failures carry a stable diagnosis code; human
//! text is rendered separately through the [`Translator`] collaborator.

use serde_json::Value;
use thiserror::Error;

use crate::i18n::{field_label_key, Translator};
use crate::schema::{FieldKind, LOAN_FIELDS};

use super::model::LoanRecord;

/// Stable diagnosis code for a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    Missing,
    NotAnInteger,
    NotPositive,
    NotANumber,
    Negative,
    NotText,
    NotADate,
    NotATimestamp,
    FixedEndWithCancelationPeriod,
    FixedEndWithMinimumTerm,
    TermPairIncomplete,
    TermUnspecified,
}

impl ValidationCode {
    /// Catalog key of the diagnosis text.
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationCode::Missing => "validation.missing",
            ValidationCode::NotAnInteger => "validation.not_an_integer",
            ValidationCode::NotPositive => "validation.not_positive",
            ValidationCode::NotANumber => "validation.not_a_number",
            ValidationCode::Negative => "validation.negative",
            ValidationCode::NotText => "validation.not_text",
            ValidationCode::NotADate => "validation.not_a_date",
            ValidationCode::NotATimestamp => "validation.not_a_timestamp",
            ValidationCode::FixedEndWithCancelationPeriod => {
                "validation.fixed_end_with_cancelation_period"
            }
            ValidationCode::FixedEndWithMinimumTerm => "validation.fixed_end_with_minimum_term",
            ValidationCode::TermPairIncomplete => "validation.term_pair_incomplete",
            ValidationCode::TermUnspecified => "validation.term_unspecified",
        }
    }
}

/// A structural or conditional-constraint failure on an attribute set.
/// `field` is `None` for the term-specification diagnoses, which concern
/// the combination of fields rather than a single one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed{}: {}", self.field.map(|f| format!(" on `{f}`")).unwrap_or_default(), self.code.message_key())]
pub struct ValidationError {
    pub field: Option<&'static str>,
    pub code: ValidationCode,
}

impl ValidationError {
    fn on(field: &'static str, code: ValidationCode) -> Self {
        Self {
            field: Some(field),
            code,
        }
    }

    fn conditional(code: ValidationCode) -> Self {
        Self { field: None, code }
    }

    /// Render the human-readable message: field label joined with the
    /// diagnosis text, or the diagnosis text alone for conditional rules.
    pub fn message(&self, translator: &dyn Translator) -> String {
        let diagnosis = translator.translate(self.code.message_key());
        match self.field {
            Some(field) => format!(
                "{} {}",
                translator.translate(&field_label_key(field)),
                diagnosis
            ),
            None => diagnosis,
        }
    }
}

/// `YYYY-MM-DD`, digits only. Pattern check, no calendar arithmetic.
fn is_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && [0, 1, 2, 3, 5, 6, 8, 9]
            .iter()
            .all(|&i| b[i].is_ascii_digit())
}

fn digits(s: &str, n: usize) -> bool {
    s.len() == n && s.bytes().all(|b| b.is_ascii_digit())
}

/// ISO-8601-like timestamp: full date, `T` or space separator, `hh:mm:ss`
/// with optional fractional seconds, then `Z` or an explicit `+hh:mm` /
/// `-hh:mm` offset.
fn is_timestamp(s: &str) -> bool {
    let Some((date, rest)) = s.split_once(['T', ' ']) else {
        return false;
    };
    if !is_date(date) {
        return false;
    }
    let time = match rest.strip_suffix('Z') {
        Some(time) => time,
        None => {
            let Some(sign) = rest.rfind(['+', '-']) else {
                return false;
            };
            let offset = &rest[sign + 1..];
            let Some((oh, om)) = offset.split_once(':') else {
                return false;
            };
            if !digits(oh, 2) || !digits(om, 2) {
                return false;
            }
            &rest[..sign]
        }
    };
    let (clock, frac) = match time.split_once('.') {
        Some((clock, frac)) => (clock, Some(frac)),
        None => (time, None),
    };
    if let Some(frac) = frac {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    let mut parts = clock.split(':');
    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some(h), Some(m), Some(sec), None)
            if digits(h, 2) && digits(m, 2) && digits(sec, 2)
    )
}

fn check_field(desc: &'static crate::schema::FieldDescriptor, value: &Value) -> Result<(), ValidationError> {
    match desc.kind {
        FieldKind::Integer { exclusive_min_zero } => match value.as_i64() {
            Some(n) if exclusive_min_zero && n <= 0 => {
                Err(ValidationError::on(desc.name, ValidationCode::NotPositive))
            }
            Some(_) => Ok(()),
            None => Err(ValidationError::on(desc.name, ValidationCode::NotAnInteger)),
        },
        FieldKind::Decimal { min_zero } => match value.as_f64() {
            Some(n) if min_zero && n < 0.0 => {
                Err(ValidationError::on(desc.name, ValidationCode::Negative))
            }
            Some(_) => Ok(()),
            None => Err(ValidationError::on(desc.name, ValidationCode::NotANumber)),
        },
        FieldKind::Text => match value {
            Value::String(_) => Ok(()),
            _ => Err(ValidationError::on(desc.name, ValidationCode::NotText)),
        },
        FieldKind::Date => match value.as_str() {
            Some(s) if is_date(s) => Ok(()),
            _ => Err(ValidationError::on(desc.name, ValidationCode::NotADate)),
        },
        FieldKind::DateTime => match value.as_str() {
            Some(s) if is_timestamp(s) => Ok(()),
            _ => Err(ValidationError::on(desc.name, ValidationCode::NotATimestamp)),
        },
    }
}

/// The combination rule for how a loan ends: either minimum term plus
/// cancellation period, or a fixed end date. Evaluated after the per-field
/// checks; the first matching diagnosis wins.
fn check_term_specification(record: &LoanRecord) -> Result<(), ValidationError> {
    let minimum_term = record.has("minimum_term");
    let cancelation_period = record.has("cancelation_period");
    let granted_until = record.has("granted_until");

    let pair_mode = minimum_term && cancelation_period && !granted_until;
    let fixed_end_mode = granted_until && !minimum_term && !cancelation_period;
    if pair_mode || fixed_end_mode {
        return Ok(());
    }

    if granted_until && cancelation_period {
        Err(ValidationError::conditional(
            ValidationCode::FixedEndWithCancelationPeriod,
        ))
    } else if granted_until && minimum_term {
        Err(ValidationError::conditional(
            ValidationCode::FixedEndWithMinimumTerm,
        ))
    } else if minimum_term != cancelation_period {
        Err(ValidationError::conditional(ValidationCode::TermPairIncomplete))
    } else {
        Err(ValidationError::conditional(ValidationCode::TermUnspecified))
    }
}

/// Decide whether an attribute set is admissible. Pure; the caller decides
/// whether to abort the mutation on failure.
pub fn validate(record: &LoanRecord) -> Result<(), ValidationError> {
    for desc in LOAN_FIELDS {
        match record.get(desc.name) {
            Some(value) => check_field(desc, value)?,
            None if desc.required => {
                return Err(ValidationError::on(desc.name, ValidationCode::Missing))
            }
            None => {}
        }
    }
    check_term_specification(record)
}
