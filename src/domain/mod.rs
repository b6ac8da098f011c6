pub mod lifecycle;
pub mod pricing;
pub mod rating;
