//! Message lookup collaborator
//!
//! Validation diagnoses are stable codes; turning a code into human text
//! happens here and only here. The core treats the translator as an opaque
//! key-to-string function, so a real localization backend can be swapped in
//! behind the trait without touching validation logic.

pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// Built-in English catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog;

impl Translator for Catalog {
    fn translate(&self, key: &str) -> String {
        let text = match key {
            // field labels
            "loan.fields.value" => "Value",
            "loan.fields.minimum_term" => "Minimum term",
            "loan.fields.cancelation_period" => "Cancellation period",
            "loan.fields.granted_until" => "Granted until",
            "loan.fields.rate_of_interest" => "Rate of interest",
            "loan.fields.loaner_name" => "Loaner name",
            "loan.fields.loaner_address" => "Loaner address",
            "loan.fields.loaner_phone" => "Loaner phone",
            "loan.fields.loaner_email" => "Loaner email",
            "loan.fields.notes" => "Notes",
            "loan.fields.contract_state" => "Contract state",
            "loan.fields.loan_state" => "Loan state",
            "loan.fields.date_created" => "Creation date",
            "loan.fields.user_created" => "Created by",

            // structural diagnoses
            "validation.missing" => "must be specified",
            "validation.not_an_integer" => "must be a whole number",
            "validation.not_positive" => "must be greater than 0",
            "validation.not_a_number" => "must be a number",
            "validation.negative" => "must not be negative",
            "validation.not_text" => "must be text",
            "validation.not_a_date" => "must be a date in YYYY-MM-DD format",
            "validation.not_a_timestamp" => "must be a timestamp with a time zone",

            // term-specification diagnoses
            "validation.fixed_end_with_cancelation_period" => {
                "a fixed end date may not be combined with a cancellation period"
            }
            "validation.fixed_end_with_minimum_term" => {
                "a fixed end date may not be combined with a minimum term"
            }
            "validation.term_pair_incomplete" => {
                "minimum term and cancellation period must be specified together"
            }
            "validation.term_unspecified" => {
                "a cancellation period or a fixed end date must be specified"
            }

            // unknown keys fall through as-is, matching the behavior of a
            // lookup catalog with a missing entry
            other => return other.to_string(),
        };
        text.to_string()
    }
}

/// Label key for a loan attribute.
pub fn field_label_key(field: &str) -> String {
    format!("loan.fields.{field}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_resolve() {
        let catalog = Catalog;
        assert_eq!(catalog.translate("loan.fields.value"), "Value");
        assert_eq!(
            catalog.translate("validation.term_unspecified"),
            "a cancellation period or a fixed end date must be specified"
        );
    }

    #[test]
    fn test_unknown_key_falls_through() {
        assert_eq!(Catalog.translate("no.such.key"), "no.such.key");
    }

    #[test]
    fn test_field_label_key_shape() {
        assert_eq!(
            field_label_key("contract_state"),
            "loan.fields.contract_state"
        );
    }
}
