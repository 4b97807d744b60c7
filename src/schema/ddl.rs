//! Table provisioning derived from the field-descriptor table
//!
//! The `loans` table is generated from [`LOAN_FIELDS`](super::LOAN_FIELDS)
//! so the validator and the storage layout can never drift apart. Decimal,
//! date and timestamp attributes travel as strings at the boundary and are
//! stored as TEXT.

use super::{FieldDescriptor, FieldKind, LOAN_FIELDS};

pub const TABLE_NAME: &str = "loans";

fn column_type(desc: &FieldDescriptor) -> &'static str {
    match desc.kind {
        FieldKind::Integer { .. } => "BIGINT",
        FieldKind::Decimal { .. } | FieldKind::Text | FieldKind::Date | FieldKind::DateTime => {
            "TEXT"
        }
    }
}

/// Generate the `CREATE TABLE IF NOT EXISTS` statement for the loans table.
pub fn create_table_sql() -> String {
    let mut columns = vec!["id UUID PRIMARY KEY".to_string()];
    for desc in LOAN_FIELDS {
        let nullability = if desc.required { " NOT NULL" } else { "" };
        columns.push(format!(
            "\"{}\" {}{}",
            desc.name,
            column_type(desc),
            nullability
        ));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        TABLE_NAME,
        columns.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_contains_every_field() {
        let sql = create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS loans"));
        for desc in LOAN_FIELDS {
            assert!(sql.contains(&format!("\"{}\"", desc.name)), "{}", desc.name);
        }
    }

    #[test]
    fn test_required_columns_are_not_null() {
        let sql = create_table_sql();
        assert!(sql.contains("\"value\" BIGINT NOT NULL"));
        assert!(sql.contains("\"rate_of_interest\" TEXT NOT NULL"));
        assert!(sql.contains("\"date_created\" TEXT NOT NULL"));
        // optional columns stay nullable
        assert!(sql.contains("\"minimum_term\" BIGINT,"));
        assert!(sql.contains("\"contract_state\" TEXT,"));
    }
}
