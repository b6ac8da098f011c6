use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::lifecycle::{CancelledBy, PaymentMethod};
use crate::models::{Order, OrderItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Fulfillment {
    Delivery,
    Pickup,
}

impl Fulfillment {
    pub fn as_str(self) -> &'static str {
        match self {
            Fulfillment::Delivery => "delivery",
            Fulfillment::Pickup => "pickup",
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeliveryRequest {
    pub fulfillment: Fulfillment,
    /// Free-form address object; required for delivery, ignored for pickup.
    pub address: Option<serde_json::Value>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub vendor_id: Uuid,
    pub items: Vec<OrderItemRequest>,
    pub delivery: DeliveryRequest,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    /// Required when the requested status is `cancelled`.
    pub reason: Option<String>,
    pub cancelled_by: Option<CancelledBy>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateOrderRequest {
    pub food: u8,
    pub delivery: u8,
    pub overall: u8,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
