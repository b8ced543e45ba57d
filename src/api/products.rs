//! Product endpoints: catalog CRUD plus category views.
//!
//! Names and categories are stored title-cased and descriptions
//! capitalized, so lookups against stored values normalize the same way.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::extract::{Query as QueryParams, State};
use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::records::Product;
use crate::store::{Filter, Op, Query, Record, SqlValue};
use crate::AppState;

use super::error::ApiError;
use super::users::MessageResponse;

/// Upper bound of products returned per category by the top listing.
const TOP_PER_CATEGORY: usize = 10;

#[derive(Debug, Deserialize)]
pub struct RegisterProductRequest {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub product_id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteProductRequest {
    pub product_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ByCategoryParams {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub message: String,
    pub products: Vec<Record>,
}

#[derive(Debug, Serialize)]
pub struct GroupedProductsResponse {
    pub message: String,
    pub products: BTreeMap<String, Vec<Record>>,
}

/// Uppercase the first letter of each whitespace-separated word and
/// lowercase the rest. Whitespace is preserved as-is.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Uppercase the first character and lowercase everything after it.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Group rows by category, keeping at most `TOP_PER_CATEGORY` per bucket in
/// the order they arrive. Categories come back sorted.
fn group_top(products: Vec<Record>) -> BTreeMap<String, Vec<Record>> {
    let mut grouped: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    for product in products {
        let category = product
            .get("category")
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string();
        let bucket = grouped.entry(category).or_default();
        if bucket.len() < TOP_PER_CATEGORY {
            bucket.push(product);
        }
    }
    grouped
}

fn validate_product_fields(
    name: &str,
    description: &str,
    category: &str,
    price: f64,
) -> Result<(), ApiError> {
    if name.is_empty() || description.is_empty() || category.is_empty() {
        return Err(ApiError::validation(
            "Name, description, and category are required.",
        ));
    }
    if name.chars().count() > 50 {
        return Err(ApiError::validation("Name must be at most 50 characters."));
    }
    if description.chars().count() > 200 {
        return Err(ApiError::validation(
            "Description must be at most 200 characters.",
        ));
    }
    if category.chars().count() > 50 {
        return Err(ApiError::validation(
            "Category must be at most 50 characters.",
        ));
    }
    if price <= 0.0 {
        return Err(ApiError::validation("Price must be greater than 0."));
    }
    Ok(())
}

/// POST /api/products/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterProductRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    validate_product_fields(&req.name, &req.description, &req.category, req.price)?;

    let product = Product {
        name: title_case(&req.name),
        description: capitalize(&req.description),
        category: title_case(&req.category),
        price: req.price,
        image_url: req.image_url,
    };
    state.store.insert(&product).await?;

    tracing::info!(name = %product.name, category = %product.category, "Product registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Product registered successfully.".to_string(),
        }),
    ))
}

/// GET /api/products/by-category?category=...
pub async fn by_category(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ByCategoryParams>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let category = params.category.unwrap_or_default();
    if category.is_empty() {
        return Err(ApiError::validation("Category should be informed."));
    }

    let products = state
        .store
        .select::<Product>(Query::new().filter("category", Op::Eq, title_case(&category)))
        .await?;

    Ok(Json(ProductsResponse {
        message: "Products successfully obtained!".to_string(),
        products,
    }))
}

/// GET /api/products
///
/// Every query parameter except `order_by`/`order_desc` is a filter term:
/// `name__like=shirt`, `price__gt=10`, `category=Clothing`. A bad term
/// fails the whole request before any query runs.
pub async fn list(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let mut query = Query::new();
    let mut order_column = None;
    let mut order_desc = false;

    for (key, value) in &params {
        match key.as_str() {
            "order_by" => order_column = Some(value.clone()),
            "order_desc" => order_desc = value == "true" || value == "1",
            _ => query = query.push(parse_term(key, value)?),
        }
    }
    if let Some(column) = order_column {
        query = query.order_by(column, order_desc);
    }

    let products = state.store.select::<Product>(query).await?;

    Ok(Json(ProductsResponse {
        message: "Products successfully obtained!".to_string(),
        products,
    }))
}

/// Coerce a raw query-string value into the narrowest SQL type: integer,
/// then real, then text.
fn parse_term(key: &str, value: &str) -> Result<Filter, ApiError> {
    let value: SqlValue = if let Ok(int) = value.parse::<i64>() {
        int.into()
    } else if let Ok(real) = value.parse::<f64>() {
        real.into()
    } else {
        value.into()
    };
    Ok(Filter::parse(key, value)?)
}

/// PUT /api/products/update
pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_product_fields(&req.name, &req.description, &req.category, req.price)?;

    // category identifies the product together with its name at
    // registration time and is never rewritten here.
    let affected = state
        .store
        .update::<Product>(
            &[("id", SqlValue::from(req.product_id))],
            &[
                ("name", SqlValue::from(title_case(&req.name))),
                ("description", SqlValue::from(capitalize(&req.description))),
                ("price", SqlValue::from(req.price)),
                ("image_url", SqlValue::from(req.image_url)),
            ],
        )
        .await?;

    if affected == 0 {
        return Err(ApiError::not_found("Product not found."));
    }

    tracing::info!(product_id = req.product_id, "Product updated");

    Ok(Json(MessageResponse {
        message: format!("Product {} updated successfully.", req.product_id),
    }))
}

/// DELETE /api/products/delete
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteProductRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state
        .store
        .delete::<Product>(&[("id", SqlValue::from(req.product_id))])
        .await?;

    if removed == 0 {
        return Err(ApiError::not_found("Product not found."));
    }

    tracing::info!(product_id = req.product_id, "Product deleted");

    Ok(Json(MessageResponse {
        message: format!("Product {} deleted successfully.", req.product_id),
    }))
}

/// GET /api/products/top-by-category
pub async fn top_by_category(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GroupedProductsResponse>, ApiError> {
    let products = state.store.select::<Product>(Query::new()).await?;

    Ok(Json(GroupedProductsResponse {
        message: "Products grouped by category fetched successfully.".to_string(),
        products: group_top(products),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorCode;
    use serde_json::json;

    fn record(category: &str, name: &str) -> Record {
        let mut record = Record::new();
        record.insert("name".to_string(), json!(name));
        record.insert("category".to_string(), json!(category));
        record
    }

    #[test]
    fn title_case_uppercases_each_word() {
        assert_eq!(title_case("linen shirt"), "Linen Shirt");
        assert_eq!(title_case("LINEN SHIRT"), "Linen Shirt");
        assert_eq!(title_case("home  decor"), "Home  Decor");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn capitalize_touches_only_the_first_character() {
        assert_eq!(capitalize("a plain shirt"), "A plain shirt");
        assert_eq!(capitalize("ALL CAPS"), "All caps");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn group_top_caps_each_category_and_sorts_buckets() {
        let mut products = Vec::new();
        for i in 0..12 {
            products.push(record("Clothing", &format!("Shirt {i}")));
        }
        products.push(record("Accessories", "Belt"));

        let grouped = group_top(products);

        let categories: Vec<&String> = grouped.keys().collect();
        assert_eq!(categories, ["Accessories", "Clothing"]);

        let clothing = &grouped["Clothing"];
        assert_eq!(clothing.len(), TOP_PER_CATEGORY);
        assert_eq!(clothing[0]["name"], json!("Shirt 0"));
        assert_eq!(clothing[9]["name"], json!("Shirt 9"));
    }

    #[test]
    fn product_fields_are_validated_before_any_io() {
        assert!(validate_product_fields("Shirt", "Nice.", "Clothing", 10.0).is_ok());

        let err = validate_product_fields("", "Nice.", "Clothing", 10.0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = validate_product_fields("Shirt", "Nice.", "Clothing", 0.0).unwrap_err();
        assert_eq!(err.message(), "Price must be greater than 0.");

        assert!(validate_product_fields(&"n".repeat(51), "d", "c", 1.0).is_err());
        assert!(validate_product_fields("n", &"d".repeat(201), "c", 1.0).is_err());
        assert!(validate_product_fields("n", "d", &"c".repeat(51), 1.0).is_err());

        // Caps count characters, not bytes.
        assert!(validate_product_fields(&"é".repeat(50), "d", "c", 1.0).is_ok());
        assert!(validate_product_fields("n", &"é".repeat(200), "c", 1.0).is_ok());
    }

    #[test]
    fn query_values_coerce_to_the_narrowest_type() {
        assert_eq!(
            parse_term("price__gt", "10").unwrap().value,
            SqlValue::Integer(10)
        );
        assert_eq!(
            parse_term("price__gt", "10.5").unwrap().value,
            SqlValue::Real(10.5)
        );
        assert_eq!(
            parse_term("name__like", "shirt").unwrap().value,
            SqlValue::Text("shirt".to_string())
        );
    }

    #[test]
    fn bad_filter_terms_surface_as_bad_request() {
        let err = parse_term("price__between", "10").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);
    }
}
