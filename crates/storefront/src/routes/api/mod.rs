//! JSON API handlers called by the storefront SPA.

pub mod checkout;
pub mod hyperpay;
pub mod products;
pub mod shipping;
