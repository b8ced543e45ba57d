//! Values bound into parameterized statements.

/// A value bound into a parameterized query.
///
/// SQLite's dynamic typing is narrowed to the storage classes the schema
/// registry declares, plus NULL for optional columns. Values only ever reach
/// the database through bind placeholders, never through string assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
}

impl SqlValue {
    /// Raw text form used when a value feeds a LIKE pattern.
    pub(crate) fn pattern_text(&self) -> String {
        match self {
            SqlValue::Integer(v) => v.to_string(),
            SqlValue::Real(v) => v.to_string(),
            SqlValue::Text(v) => v.clone(),
            SqlValue::Null => String::new(),
        }
    }

    /// Attach this value to a query's bind list.
    pub(crate) fn bind_to<'q>(
        &self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        match self {
            SqlValue::Integer(v) => query.bind(*v),
            SqlValue::Real(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.clone()),
            SqlValue::Null => query.bind(Option::<String>::None),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(value as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_the_matching_storage_class() {
        assert_eq!(SqlValue::from(42i64), SqlValue::Integer(42));
        assert_eq!(SqlValue::from(2.5f64), SqlValue::Real(2.5));
        assert_eq!(SqlValue::from("abc"), SqlValue::Text("abc".to_string()));
        assert_eq!(SqlValue::from(Option::<i64>::None), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".to_string()));
    }

    #[test]
    fn pattern_text_renders_non_text_values() {
        assert_eq!(SqlValue::Integer(7).pattern_text(), "7");
        assert_eq!(SqlValue::Text("shirt".into()).pattern_text(), "shirt");
        assert_eq!(SqlValue::Null.pattern_text(), "");
    }
}
