//! Core types for Kirana.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod rating;
pub mod status;

pub use id::*;
pub use money::{CurrencyCode, CurrencyError, Money, line_total};
pub use rating::{Rating, RatingError};
pub use status::*;
