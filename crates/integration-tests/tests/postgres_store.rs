//! `PgStore` against a real database.
//!
//! These tests require a migrated `PostgreSQL` database:
//!
//! ```bash
//! kirana migrate
//! cargo test -p kirana-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rust_decimal::Decimal;
use secrecy::SecretString;

use kirana_core::{CurrencyCode, OrderStatus, Rating, UserId};
use kirana_storefront::checkout::{LineReview, submit_order};
use kirana_storefront::db::{self, PgStore};
use kirana_storefront::models::{AddressForm, NewOrder, NewOrderLine, NewProduct, NewReview};
use kirana_storefront::store::{
    AddressStore, CartStore, OrderStore, ProductStore, ReviewStore, Store,
};

async fn store() -> PgStore {
    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("STOREFRONT_DATABASE_URL must point at a migrated database");
    let pool = db::create_pool(&SecretString::from(url))
        .await
        .expect("database reachable");
    PgStore::new(pool)
}

fn unique_product(title: &str, price: i64) -> NewProduct {
    NewProduct {
        title: format!("{title} {}", uuid::Uuid::new_v4()),
        description: Some("integration test product".to_string()),
        price: Decimal::from(price),
        mrp: Decimal::from(price),
        thumbnail_url: None,
        image_urls: vec!["/a.jpg".to_string(), "/b.jpg".to_string()],
    }
}

fn address_form() -> AddressForm {
    AddressForm {
        label: "Home".to_string(),
        name: "Asha Rao".to_string(),
        address_line: "12 MG Road".to_string(),
        city: "Bengaluru".to_string(),
        pincode: "560001".to_string(),
        phone: "9800000000".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_ping() {
    store().await.ping().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_upsert_product_updates_by_title() {
    let store = store().await;
    let mut product = unique_product("Atta", 100);

    let first = store.upsert_product(&product).await.unwrap();
    product.price = Decimal::from(90);
    let second = store.upsert_product(&product).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.price, Decimal::from(90));
    assert_eq!(second.image_urls.len(), 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_search_escapes_wildcards() {
    let store = store().await;
    let product = store
        .upsert_product(&unique_product("100% Pure Ghee", 500))
        .await
        .unwrap();

    let hits = store.search_products("100%", 50).await.unwrap();
    assert!(hits.iter().any(|p| p.id == product.id));
    assert!(hits.iter().all(|p| p.title.contains("100%")));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_list_products_is_ordered_by_title() {
    let store = store().await;
    let product = store.upsert_product(&unique_product("Sooji", 40)).await.unwrap();

    let products = store.list_products().await.unwrap();
    assert!(products.iter().any(|p| p.id == product.id));
    assert!(products.windows(2).all(|w| w[0].title <= w[1].title));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_cart_insert_accumulates() {
    let store = store().await;
    let user = UserId::new();
    let product = store.upsert_product(&unique_product("Besan", 50)).await.unwrap();

    store.insert_cart_line(user, product.id, 1).await.unwrap();
    store.insert_cart_line(user, product.id, 2).await.unwrap();

    let cart = store.list_cart(user).await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].quantity, 3);

    store.set_cart_quantity(user, cart[0].id, 5).await.unwrap();
    assert!(
        store
            .delete_cart_line(UserId::new(), cart[0].id)
            .await
            .is_err()
    );
    store.clear_cart(user).await.unwrap();
    assert!(store.list_cart(user).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_submit_order_writes_header_and_lines() {
    let store = store().await;
    let user = UserId::new();
    let a = store.upsert_product(&unique_product("Atta", 100)).await.unwrap();
    let b = store.upsert_product(&unique_product("Besan", 50)).await.unwrap();
    let address = store
        .create_address(user, &address_form().validate().unwrap())
        .await
        .unwrap();

    store.insert_cart_line(user, a.id, 2).await.unwrap();
    store.insert_cart_line(user, b.id, 1).await.unwrap();
    let cart = store.list_cart(user).await.unwrap();
    let snapshot = LineReview::from_cart(&cart, CurrencyCode::INR).freeze().unwrap();

    let order_id = submit_order(&store, user, address.id, &snapshot).await.unwrap();

    let order = store.get_order(user, order_id).await.unwrap().unwrap();
    assert_eq!(order.total_amount, Decimal::from(250));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.currency, CurrencyCode::INR);

    let lines = store.list_order_lines(order_id).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].product_id, snapshot.lines()[0].product_id);

    assert!(store.get_order(UserId::new(), order_id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_place_order_is_atomic() {
    let store = store().await;
    let user = UserId::new();
    let address = store
        .create_address(user, &address_form().validate().unwrap())
        .await
        .unwrap();
    let order = NewOrder {
        address_id: address.id,
        status: OrderStatus::Pending,
        total_amount: Decimal::from(10),
        currency: CurrencyCode::INR,
    };
    let line = NewOrderLine {
        product_id: kirana_core::ProductId::new(),
        product_title: "Duplicate".to_string(),
        unit_price: Decimal::from(10),
        quantity: u32::MAX,
    };

    // A quantity that does not fit the column fails the line insert.
    assert!(store.place_order(user, &order, &[line]).await.is_err());
    assert!(store.list_orders(user).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_reviews_round_trip() {
    let store = store().await;
    let product = store.upsert_product(&unique_product("Jaggery", 60)).await.unwrap();
    let review = store
        .create_review(&NewReview {
            product_id: product.id,
            user_id: UserId::new(),
            rating: Rating::new(4).unwrap(),
            review_text: Some("Good".to_string()),
        })
        .await
        .unwrap();

    let reviews = store.list_reviews(product.id).await.unwrap();
    assert_eq!(reviews, vec![review]);
}
