//! Typed filter and ordering terms for select queries.
//!
//! Filters are plain data. The store validates every referenced column
//! against the schema registry before assembling SQL, so a bad term fails
//! the whole operation up front instead of producing a broken statement.

use crate::store::error::StoreError;
use crate::store::value::SqlValue;

/// Comparison operator of a filter term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
}

impl Op {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Ge => ">=",
            Op::Le => "<=",
            Op::Like => "LIKE",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Op> {
        match suffix {
            "eq" => Some(Op::Eq),
            "gt" => Some(Op::Gt),
            "lt" => Some(Op::Lt),
            "ge" => Some(Op::Ge),
            "le" => Some(Op::Le),
            "like" => Some(Op::Like),
            _ => None,
        }
    }
}

/// One conjunctive predicate term: `column <op> value`.
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub op: Op,
    pub value: SqlValue,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: Op, value: impl Into<SqlValue>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Parse a string-form term: `attribute` for equality or
    /// `attribute__operator` for anything else. Unknown operator suffixes
    /// are rejected here, before any query is built.
    pub fn parse(term: &str, value: impl Into<SqlValue>) -> Result<Filter, StoreError> {
        match term.rsplit_once("__") {
            Some((column, suffix)) => {
                let op = Op::from_suffix(suffix).ok_or_else(|| {
                    StoreError::query(format!(
                        "unknown filter operator \"{suffix}\" in \"{term}\""
                    ))
                })?;
                Ok(Filter::new(column, op, value))
            }
            None => Ok(Filter::new(term, Op::Eq, value)),
        }
    }

    /// Value as bound into the statement. LIKE terms are wrapped so the
    /// match is substring rather than whole-value.
    pub(crate) fn bind_value(&self) -> SqlValue {
        match self.op {
            Op::Like => SqlValue::Text(format!("%{}%", self.value.pattern_text())),
            _ => self.value.clone(),
        }
    }
}

/// Ordering clause of a select.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// A declarative select: conjunctive filter terms plus optional ordering.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub(crate) filters: Vec<Filter>,
    pub(crate) order: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(self, column: impl Into<String>, op: Op, value: impl Into<SqlValue>) -> Self {
        self.push(Filter::new(column, op, value))
    }

    pub fn push(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, descending: bool) -> Self {
        self.order = Some(OrderBy {
            column: column.into(),
            descending,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_term_means_equality() {
        let filter = Filter::parse("age", 30i64).unwrap();
        assert_eq!(filter.column, "age");
        assert_eq!(filter.op, Op::Eq);
        assert_eq!(filter.value, SqlValue::Integer(30));
    }

    #[test]
    fn suffixed_terms_select_the_operator() {
        assert_eq!(Filter::parse("age__gt", 18i64).unwrap().op, Op::Gt);
        assert_eq!(Filter::parse("age__lt", 18i64).unwrap().op, Op::Lt);
        assert_eq!(Filter::parse("age__ge", 18i64).unwrap().op, Op::Ge);
        assert_eq!(Filter::parse("age__le", 18i64).unwrap().op, Op::Le);
        assert_eq!(Filter::parse("name__like", "ro").unwrap().op, Op::Like);
        assert_eq!(Filter::parse("age__eq", 18i64).unwrap().op, Op::Eq);
    }

    #[test]
    fn column_part_survives_inner_underscores() {
        let filter = Filter::parse("image_url__like", "cdn").unwrap();
        assert_eq!(filter.column, "image_url");
        assert_eq!(filter.op, Op::Like);
    }

    #[test]
    fn unknown_operator_suffix_is_rejected() {
        let err = Filter::parse("age__between", 1i64).unwrap_err();
        assert!(err.to_string().contains("between"));
        assert_eq!(err.code(), 4);
    }

    #[test]
    fn like_values_are_wrapped_for_substring_match() {
        let filter = Filter::new("name", Op::Like, "ro");
        assert_eq!(filter.bind_value(), SqlValue::Text("%ro%".into()));

        let eq = Filter::new("name", Op::Eq, "ro");
        assert_eq!(eq.bind_value(), SqlValue::Text("ro".into()));
    }

    #[test]
    fn operator_sql_fragments() {
        assert_eq!(Op::Eq.sql(), "=");
        assert_eq!(Op::Ge.sql(), ">=");
        assert_eq!(Op::Like.sql(), "LIKE");
    }
}
