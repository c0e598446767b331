//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `checkout` - Resolve cart lines against the catalog and open a Shopify
//!   cart for hosted checkout
//! - `payment` - Open `HyperPay` sessions and verify their outcome

pub mod checkout;
pub mod payment;

pub use checkout::{CheckoutError, CheckoutService};
pub use payment::{PaymentError, PaymentService};
