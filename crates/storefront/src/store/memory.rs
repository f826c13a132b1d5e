//! In-process store used by tests and local runs.
//!
//! `MemoryStore` implements every store trait over plain collections behind
//! a mutex. Individual operations can be made to fail with [`FailPoint`] so
//! the checkout's partial-failure paths can be exercised without a database.
//! It does not override [`OrderStore::place_order`], so orders go through the
//! header-then-lines path with its compensating delete.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use kirana_core::{AddressId, CartLineId, OrderId, OrderLineId, ProductId, ReviewId, UserId};

use super::{AddressStore, CartStore, OrderStore, ProductStore, RepositoryError, ReviewStore, Store};
use crate::models::{
    Address, CartLine, NewAddress, NewOrder, NewOrderLine, NewProduct, NewReview, Order,
    OrderLine, Product, ProductSummary, Review,
};

/// An operation that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    ListAddresses,
    CreateAddress,
    GetProducts,
    ListCart,
    CreateOrder,
    CreateOrderLines,
    DeleteOrder,
    CreateReview,
    Ping,
}

#[derive(Debug)]
struct CartRow {
    id: CartLineId,
    user_id: UserId,
    product_id: ProductId,
    quantity: u32,
}

#[derive(Debug)]
struct OrderRow {
    user_id: UserId,
    order: Order,
}

#[derive(Debug, Default)]
struct Inner {
    products: Vec<Product>,
    addresses: Vec<Address>,
    cart: Vec<CartRow>,
    orders: Vec<OrderRow>,
    order_lines: Vec<OrderLine>,
    reviews: Vec<Review>,
    failures: HashSet<FailPoint>,
}

/// Store backed by in-memory collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    calls: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count a trait call and fail it if `point` is armed.
    fn enter(&self, point: Option<FailPoint>) -> Result<MutexGuard<'_, Inner>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.lock();
        if let Some(point) = point
            && inner.failures.contains(&point)
        {
            return Err(RepositoryError::Unavailable(format!("{point:?} failed")));
        }
        Ok(inner)
    }

    /// Make every later `point` operation fail until [`Self::heal`] is called.
    pub fn fail(&self, point: FailPoint) {
        self.lock().failures.insert(point);
    }

    /// Stop failing `point`.
    pub fn heal(&self, point: FailPoint) {
        self.lock().failures.remove(&point);
    }

    /// Number of store trait calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Add a product to the catalogue.
    pub fn insert_product(&self, product: &NewProduct) -> Product {
        let product = Product {
            id: ProductId::new(),
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price,
            mrp: product.mrp,
            thumbnail_url: product.thumbnail_url.clone(),
            image_urls: product.image_urls.clone(),
            created_at: Utc::now(),
        };
        self.lock().products.push(product.clone());
        product
    }

    /// Delete a product (and, as the database would, its cart rows).
    pub fn remove_product(&self, id: ProductId) {
        let mut inner = self.lock();
        inner.products.retain(|p| p.id != id);
        inner.cart.retain(|row| row.product_id != id);
    }

    /// Change a product's current price.
    pub fn set_price(&self, id: ProductId, price: Decimal) {
        if let Some(product) = self.lock().products.iter_mut().find(|p| p.id == id) {
            product.price = price;
        }
    }

    /// Every order header, oldest first.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.iter().map(|row| row.order.clone()).collect()
    }

    /// Every order line, in write order.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lock().order_lines.clone()
    }
}

fn cart_line(inner: &Inner, row: &CartRow) -> Result<CartLine, RepositoryError> {
    let product = inner
        .products
        .iter()
        .find(|p| p.id == row.product_id)
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!("cart row {} has no product", row.id))
        })?;

    Ok(CartLine {
        id: row.id,
        product: ProductSummary::from(product),
        quantity: row.quantity,
    })
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn list_addresses(&self, user: UserId) -> Result<Vec<Address>, RepositoryError> {
        let inner = self.enter(Some(FailPoint::ListAddresses))?;
        Ok(inner
            .addresses
            .iter()
            .filter(|a| a.user_id == user)
            .cloned()
            .collect())
    }

    async fn create_address(
        &self,
        user: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let mut inner = self.enter(Some(FailPoint::CreateAddress))?;
        let address = Address {
            id: AddressId::new(),
            user_id: user,
            label: address.label.clone(),
            name: address.name.clone(),
            address_line: address.address_line.clone(),
            city: address.city.clone(),
            pincode: address.pincode.clone(),
            phone: address.phone.clone(),
            created_at: Utc::now(),
        };
        inner.addresses.push(address.clone());
        Ok(address)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn get_products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.enter(Some(FailPoint::GetProducts))?;
        Ok(inner
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let inner = self.enter(Some(FailPoint::GetProducts))?;
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.enter(Some(FailPoint::GetProducts))?;
        let mut products = inner.products.clone();
        products.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(products)
    }

    async fn search_products(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.enter(None)?;
        let needle = term.to_lowercase();
        let mut matches: Vec<Product> = inner
            .products
            .iter()
            .filter(|p| {
                p.title.to_lowercase().contains(&needle)
                    || p
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.title.cmp(&b.title));
        matches.truncate(limit);
        Ok(matches)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(
        &self,
        user: UserId,
        order: &NewOrder,
    ) -> Result<OrderId, RepositoryError> {
        let mut inner = self.enter(Some(FailPoint::CreateOrder))?;
        let id = OrderId::new();
        inner.orders.push(OrderRow {
            user_id: user,
            order: Order {
                id,
                address_id: order.address_id,
                status: order.status,
                total_amount: order.total_amount,
                currency: order.currency,
                created_at: Utc::now(),
            },
        });
        Ok(id)
    }

    async fn create_order_lines(
        &self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<(), RepositoryError> {
        let mut inner = self.enter(Some(FailPoint::CreateOrderLines))?;
        if !inner.orders.iter().any(|row| row.order.id == order_id) {
            return Err(RepositoryError::NotFound);
        }
        inner
            .order_lines
            .extend(lines.iter().map(|line| OrderLine {
                id: OrderLineId::new(),
                order_id,
                product_id: line.product_id,
                product_title: line.product_title.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
            }));
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        let mut inner = self.enter(Some(FailPoint::DeleteOrder))?;
        inner.orders.retain(|row| row.order.id != order_id);
        inner.order_lines.retain(|line| line.order_id != order_id);
        Ok(())
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let inner = self.enter(None)?;
        // Insertion order is creation order; newest first.
        Ok(inner
            .orders
            .iter()
            .rev()
            .filter(|row| row.user_id == user)
            .map(|row| row.order.clone())
            .collect())
    }

    async fn get_order(
        &self,
        user: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let inner = self.enter(None)?;
        Ok(inner
            .orders
            .iter()
            .find(|row| row.order.id == order_id && row.user_id == user)
            .map(|row| row.order.clone()))
    }

    async fn list_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let inner = self.enter(None)?;
        Ok(inner
            .order_lines
            .iter()
            .filter(|line| line.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn list_cart(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let inner = self.enter(Some(FailPoint::ListCart))?;
        inner
            .cart
            .iter()
            .filter(|row| row.user_id == user)
            .map(|row| cart_line(&inner, row))
            .collect()
    }

    async fn find_cart_line(
        &self,
        user: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let inner = self.enter(None)?;
        inner
            .cart
            .iter()
            .find(|row| row.user_id == user && row.product_id == product_id)
            .map(|row| cart_line(&inner, row))
            .transpose()
    }

    async fn insert_cart_line(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLineId, RepositoryError> {
        let mut inner = self.enter(None)?;
        if !inner.products.iter().any(|p| p.id == product_id) {
            return Err(RepositoryError::NotFound);
        }
        if let Some(row) = inner
            .cart
            .iter_mut()
            .find(|row| row.user_id == user && row.product_id == product_id)
        {
            row.quantity = row.quantity.saturating_add(quantity);
            return Ok(row.id);
        }
        let id = CartLineId::new();
        inner.cart.push(CartRow {
            id,
            user_id: user,
            product_id,
            quantity,
        });
        Ok(id)
    }

    async fn set_cart_quantity(
        &self,
        user: UserId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.enter(None)?;
        let row = inner
            .cart
            .iter_mut()
            .find(|row| row.id == line_id && row.user_id == user)
            .ok_or(RepositoryError::NotFound)?;
        row.quantity = quantity;
        Ok(())
    }

    async fn delete_cart_line(
        &self,
        user: UserId,
        line_id: CartLineId,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.enter(None)?;
        let before = inner.cart.len();
        inner
            .cart
            .retain(|row| !(row.id == line_id && row.user_id == user));
        if inner.cart.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn clear_cart(&self, user: UserId) -> Result<(), RepositoryError> {
        let mut inner = self.enter(None)?;
        inner.cart.retain(|row| row.user_id != user);
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn create_review(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let mut inner = self.enter(Some(FailPoint::CreateReview))?;
        if !inner.products.iter().any(|p| p.id == review.product_id) {
            return Err(RepositoryError::NotFound);
        }
        let review = Review {
            id: ReviewId::new(),
            product_id: review.product_id,
            user_id: review.user_id,
            rating: review.rating,
            review_text: review.review_text.clone(),
            created_at: Utc::now(),
        };
        inner.reviews.push(review.clone());
        Ok(review)
    }

    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let inner = self.enter(None)?;
        Ok(inner
            .reviews
            .iter()
            .rev()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.enter(Some(FailPoint::Ping)).map(drop)
    }
}
