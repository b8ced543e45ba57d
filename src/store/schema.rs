//! Schema metadata for the record types the store can persist.
//!
//! The registry is built once at startup from the record definitions and
//! handed to the store. Filter validation and table creation both read it;
//! nothing mutates it afterwards.

use std::collections::BTreeMap;

use crate::store::value::SqlValue;

/// SQLite storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    fn sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// One column of a registered table.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    name: &'static str,
    ty: ColumnType,
    nullable: bool,
    primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            nullable: false,
            primary_key: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the generated integer key. One per table.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ty(&self) -> ColumnType {
        self.ty
    }

    fn ddl(&self) -> String {
        let mut out = format!("\"{}\" {}", self.name, self.ty.sql());
        if self.primary_key {
            out.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            out.push_str(" NOT NULL");
        }
        out
    }
}

/// Table-level constraint emitted into the CREATE TABLE statement.
#[derive(Debug, Clone)]
pub enum TableConstraint {
    /// UNIQUE over one or more columns.
    Unique(Vec<&'static str>),
    /// Raw CHECK expression.
    Check(&'static str),
}

impl TableConstraint {
    fn ddl(&self) -> String {
        match self {
            TableConstraint::Unique(columns) => {
                let quoted: Vec<String> =
                    columns.iter().map(|c| format!("\"{c}\"")).collect();
                format!("UNIQUE ({})", quoted.join(", "))
            }
            TableConstraint::Check(expr) => format!("CHECK ({expr})"),
        }
    }
}

/// Declared shape of one table: columns plus table-level constraints.
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: &'static str,
    columns: Vec<ColumnDef>,
    constraints: Vec<TableConstraint>,
}

impl TableSchema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn constraint(mut self, constraint: TableConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Declared spelling of `column`, if the table has it. SQL assembly only
    /// ever emits identifiers returned from here, so caller-supplied strings
    /// never reach a statement.
    pub fn canonical_column(&self, column: &str) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.name)
    }

    /// CREATE TABLE IF NOT EXISTS statement for this table.
    pub fn create_table_sql(&self) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(ColumnDef::ddl).collect();
        parts.extend(self.constraints.iter().map(TableConstraint::ddl));
        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            self.name,
            parts.join(", ")
        )
    }
}

/// All table schemas known to a store, keyed by table name.
///
/// Built by the caller and moved into the store at connect time. There is no
/// global registry; two stores can hold different registries side by side.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: BTreeMap<&'static str, TableSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table schema. Registering the same name twice replaces the
    /// earlier entry.
    pub fn register(mut self, schema: TableSchema) -> Self {
        self.tables.insert(schema.name, schema);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// A record type the store can persist.
///
/// `values` yields the column/value pairs for an insert; the generated
/// primary key is never among them.
pub trait Entity {
    /// Table this type maps to.
    const TABLE: &'static str;

    /// Column metadata registered for the table.
    fn schema() -> TableSchema;

    /// Column/value pairs for inserting this record.
    fn values(&self) -> Vec<(&'static str, SqlValue)>;
}
