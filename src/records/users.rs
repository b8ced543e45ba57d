//! User records: credentials plus a coarse role.

use crate::store::{ColumnDef, ColumnType, Entity, SqlValue, TableConstraint, TableSchema};

/// Roles a user can hold. The table's CHECK constraint mirrors this list.
pub const ROLES: &[&str] = &["admin", "user"];

/// One user row. `password` always holds an Argon2 hash, never plaintext.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub password: String,
    pub role: String,
}

impl Entity for User {
    const TABLE: &'static str = "users";

    fn schema() -> TableSchema {
        TableSchema::new("users")
            .column(ColumnDef::new("id", ColumnType::Integer).primary_key())
            .column(ColumnDef::new("username", ColumnType::Text))
            .column(ColumnDef::new("password", ColumnType::Text))
            .column(ColumnDef::new("role", ColumnType::Text))
            .constraint(TableConstraint::Unique(vec!["username"]))
            .constraint(TableConstraint::Check("role IN ('admin', 'user')"))
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("username", self.username.as_str().into()),
            ("password", self.password.as_str().into()),
            ("role", self.role.as_str().into()),
        ]
    }
}
