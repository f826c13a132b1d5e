//! Seed the product catalogue from a JSON file.
//!
//! The file is an array of products. Products are matched on title, so
//! running the same file twice updates rather than duplicates.

use kirana_storefront::db::{self, PgStore};
use kirana_storefront::models::NewProduct;

use super::{CommandError, database_url};

fn parse_products(path: &str, content: &str) -> Result<Vec<NewProduct>, CommandError> {
    serde_json::from_str(content).map_err(|source| CommandError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Insert or update every product in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the database
/// rejects a product.
pub async fn products(file_path: &str) -> Result<(), CommandError> {
    // Read and parse before connecting to the database
    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|source| CommandError::Read {
            path: file_path.to_string(),
            source,
        })?;
    let products = parse_products(file_path, &content)?;
    tracing::info!(path = %file_path, count = products.len(), "Parsed products");

    let pool = db::create_pool(&database_url()?).await?;
    let store = PgStore::new(pool);

    for product in &products {
        let saved = store.upsert_product(product).await?;
        tracing::info!(product_id = %saved.id, title = %saved.title, "Product seeded");
    }

    tracing::info!("Seeding complete! {} products", products.len());
    Ok(())
}
