//! Record definitions registered with the store.

mod products;
mod users;

pub use products::Product;
pub use users::{User, ROLES};

use crate::store::{Entity, SchemaRegistry};

/// Build the registry of every persistable type. Constructed once at
/// startup and moved into the store.
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .register(User::schema())
        .register(Product::schema())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_holds_both_tables() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert!(registry.table("users").is_some());
        assert!(registry.table("products").is_some());
    }

    #[test]
    fn users_ddl_enforces_unique_names_and_known_roles() {
        let sql = User::schema().create_table_sql();
        assert!(sql.contains("UNIQUE (\"username\")"));
        assert!(sql.contains("CHECK (role IN ('admin', 'user'))"));
    }

    #[test]
    fn products_ddl_scopes_name_uniqueness_to_category() {
        let sql = Product::schema().create_table_sql();
        assert!(sql.contains("UNIQUE (\"name\", \"category\")"));
        assert!(sql.contains("\"image_url\" TEXT,"));
        assert!(sql.contains("\"price\" REAL NOT NULL"));
    }

    #[test]
    fn product_insert_values_skip_the_generated_id() {
        let product = Product {
            name: "Linen Shirt".to_string(),
            description: "A shirt.".to_string(),
            category: "Clothing".to_string(),
            price: 49.9,
            image_url: None,
        };
        let columns: Vec<&str> = product.values().iter().map(|(c, _)| *c).collect();
        assert_eq!(
            columns,
            ["name", "description", "category", "price", "image_url"]
        );
    }
}
