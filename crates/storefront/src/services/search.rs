//! Product search.

use tracing::instrument;

use super::ServiceError;
use crate::models::ProductSummary;
use crate::store::ProductStore;

/// Maximum number of results returned by [`search_products`].
pub const SEARCH_RESULT_LIMIT: usize = 5;

/// Case-insensitive search over product titles and descriptions.
///
/// A blank term returns nothing without querying the store.
///
/// # Errors
///
/// Returns `ServiceError::Repository` if the store fails.
#[instrument(skip(store))]
pub async fn search_products<S>(store: &S, term: &str) -> Result<Vec<ProductSummary>, ServiceError>
where
    S: ProductStore + ?Sized,
{
    let term = term.trim();
    if term.is_empty() {
        return Ok(Vec::new());
    }

    let products = store.search_products(term, SEARCH_RESULT_LIMIT).await?;
    Ok(products.iter().map(ProductSummary::from).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::NewProduct;
    use crate::store::memory::MemoryStore;

    fn seed(store: &MemoryStore, title: &str, description: Option<&str>) {
        store.insert_product(&NewProduct {
            title: title.to_string(),
            description: description.map(String::from),
            price: Decimal::from(10),
            mrp: Decimal::from(12),
            thumbnail_url: None,
            image_urls: Vec::new(),
        });
    }

    #[tokio::test]
    async fn test_blank_term_skips_store() {
        let store = MemoryStore::new();
        seed(&store, "Rice", None);

        assert!(search_products(&store, "   ").await.unwrap().is_empty());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_matches_description_case_insensitively() {
        let store = MemoryStore::new();
        seed(&store, "Toor Dal", Some("Split PIGEON peas"));
        seed(&store, "Rice", None);

        let results = search_products(&store, " pigeon ").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Toor Dal");
    }

    #[tokio::test]
    async fn test_results_are_capped() {
        let store = MemoryStore::new();
        for i in 0..9 {
            seed(&store, &format!("Masala {i}"), None);
        }

        let results = search_products(&store, "masala").await.unwrap();
        assert_eq!(results.len(), SEARCH_RESULT_LIMIT);
    }
}
