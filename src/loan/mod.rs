//! Loan domain: record lifecycle, validation, state transitions,
//! persistence.

pub mod model;
pub mod service;
pub mod transitions;
pub mod validate;

pub use model::{ContractState, LoanError, LoanRecord, LoanState};
pub use service::LoanService;
pub use transitions::{guard_update, AuthorizedChanges, TransitionError};
pub use validate::{validate, ValidationCode, ValidationError};
