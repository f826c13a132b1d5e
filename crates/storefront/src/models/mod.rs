//! Domain models for storefront.
//!
//! These types represent validated domain objects separate from database row
//! types. Rows are mapped into them by the store implementations.

pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod session;

pub use address::{Address, AddressForm, AddressValidationError, NewAddress};
pub use cart::{CartLine, CartTotals};
pub use order::{NewOrder, NewOrderLine, Order, OrderItem, OrderLine};
pub use product::{NewProduct, Product, ProductSummary};
pub use review::{NewReview, RatingSummary, Review};
pub use session::{CurrentUser, keys as session_keys};
