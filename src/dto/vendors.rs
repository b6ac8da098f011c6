use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Vendor;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVendorRequest {
    pub business_name: String,
    pub description: Option<String>,
    pub delivery_fee: i64,
    pub minimum_order: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVendorRequest {
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub delivery_fee: Option<i64>,
    pub minimum_order: Option<i64>,
    pub is_active: Option<bool>,
}

/// Admin decision on a pending vendor application.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewVendorRequest {
    /// `approved` or `rejected`.
    pub decision: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VendorList {
    pub items: Vec<Vendor>,
}
