//! Product records for the catalog.

use crate::store::{ColumnDef, ColumnType, Entity, SqlValue, TableConstraint, TableSchema};

/// One product row. `(name, category)` is unique across the table, so the
/// same name may appear once per category.
#[derive(Debug, Clone)]
pub struct Product {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub image_url: Option<String>,
}

impl Entity for Product {
    const TABLE: &'static str = "products";

    fn schema() -> TableSchema {
        TableSchema::new("products")
            .column(ColumnDef::new("id", ColumnType::Integer).primary_key())
            .column(ColumnDef::new("name", ColumnType::Text))
            .column(ColumnDef::new("description", ColumnType::Text))
            .column(ColumnDef::new("category", ColumnType::Text))
            .column(ColumnDef::new("price", ColumnType::Real))
            .column(ColumnDef::new("image_url", ColumnType::Text).nullable())
            .constraint(TableConstraint::Unique(vec!["name", "category"]))
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("name", self.name.as_str().into()),
            ("description", self.description.as_str().into()),
            ("category", self.category.as_str().into()),
            ("price", self.price.into()),
            ("image_url", self.image_url.clone().into()),
        ]
    }
}
