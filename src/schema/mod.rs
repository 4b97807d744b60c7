//! Loan field schema
//!
//! A static, typed descriptor table for every persisted loan attribute.
//! Two independent consumers read it: the structural validator
//! (`crate::loan::validate`) and the table provisioning in
//! [`ddl`](crate::schema::ddl). Audit columns (`date_*`/`user_*`) are part
//! of the table but are only ever written by the transition guard, never
//! accepted from callers.

pub mod ddl;

/// Semantic type of a loan attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole number; `exclusive_min_zero` requires the value to be > 0.
    Integer { exclusive_min_zero: bool },
    /// Decimal number; `min_zero` requires the value to be >= 0.
    /// Transmitted and stored as a string, normalized from a possible
    /// comma decimal separator on the way in.
    Decimal { min_zero: bool },
    /// Free-form text.
    Text,
    /// Calendar date string, `YYYY-MM-DD`.
    Date,
    /// Timestamp string with an explicit offset or `Z` designator.
    DateTime,
}

/// One persisted loan attribute.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// The two attributes editable after creation, and only through an
/// authorized state transition.
pub const PROTECTED_FIELDS: [&str; 2] = ["contract_state", "loan_state"];

/// Full loan attribute set. Order is also the column order of the
/// generated table. The `loan_repaid` audit pair has no reachable
/// transition yet; the `loan_state` axis is extensible and the columns
/// are provisioned up front.
pub const LOAN_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "value",
        kind: FieldKind::Integer {
            exclusive_min_zero: true,
        },
        required: true,
    },
    FieldDescriptor {
        name: "minimum_term",
        kind: FieldKind::Integer {
            exclusive_min_zero: true,
        },
        required: false,
    },
    FieldDescriptor {
        name: "cancelation_period",
        kind: FieldKind::Integer {
            exclusive_min_zero: false,
        },
        required: false,
    },
    FieldDescriptor {
        name: "granted_until",
        kind: FieldKind::Date,
        required: false,
    },
    FieldDescriptor {
        name: "rate_of_interest",
        kind: FieldKind::Decimal { min_zero: true },
        required: true,
    },
    FieldDescriptor {
        name: "loaner_name",
        kind: FieldKind::Text,
        required: true,
    },
    FieldDescriptor {
        name: "loaner_address",
        kind: FieldKind::Text,
        required: true,
    },
    FieldDescriptor {
        name: "loaner_phone",
        kind: FieldKind::Text,
        required: false,
    },
    FieldDescriptor {
        name: "loaner_email",
        kind: FieldKind::Text,
        required: false,
    },
    FieldDescriptor {
        name: "notes",
        kind: FieldKind::Text,
        required: false,
    },
    FieldDescriptor {
        name: "contract_state",
        kind: FieldKind::Text,
        required: false,
    },
    FieldDescriptor {
        name: "loan_state",
        kind: FieldKind::Text,
        required: false,
    },
    FieldDescriptor {
        name: "date_created",
        kind: FieldKind::DateTime,
        required: true,
    },
    FieldDescriptor {
        name: "user_created",
        kind: FieldKind::Text,
        required: true,
    },
    FieldDescriptor {
        name: "date_contract_sent_to_loaner",
        kind: FieldKind::DateTime,
        required: false,
    },
    FieldDescriptor {
        name: "user_contract_sent_to_loaner",
        kind: FieldKind::Text,
        required: false,
    },
    FieldDescriptor {
        name: "date_contract_signature_received",
        kind: FieldKind::DateTime,
        required: false,
    },
    FieldDescriptor {
        name: "user_contract_signature_received",
        kind: FieldKind::Text,
        required: false,
    },
    FieldDescriptor {
        name: "date_contract_signature_sent",
        kind: FieldKind::DateTime,
        required: false,
    },
    FieldDescriptor {
        name: "user_contract_signature_sent",
        kind: FieldKind::Text,
        required: false,
    },
    FieldDescriptor {
        name: "date_loan_loaned",
        kind: FieldKind::DateTime,
        required: false,
    },
    FieldDescriptor {
        name: "user_loan_loaned",
        kind: FieldKind::Text,
        required: false,
    },
    FieldDescriptor {
        name: "date_loan_repaid",
        kind: FieldKind::DateTime,
        required: false,
    },
    FieldDescriptor {
        name: "user_loan_repaid",
        kind: FieldKind::Text,
        required: false,
    },
];

/// Look up a descriptor by field name.
pub fn field(name: &str) -> Option<&'static FieldDescriptor> {
    LOAN_FIELDS.iter().find(|d| d.name == name)
}

/// Whether a field may be edited after creation.
pub fn is_protected(name: &str) -> bool {
    PROTECTED_FIELDS.contains(&name)
}
