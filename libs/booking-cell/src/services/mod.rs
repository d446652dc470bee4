pub mod checkout;
pub mod lifecycle;
pub mod meeting;
pub mod pricing;
