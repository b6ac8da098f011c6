use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::lifecycle::OrderStatus;
use crate::domain::pricing::Pricing;
use crate::entity;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Vendor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub description: Option<String>,
    pub delivery_fee: i64,
    pub minimum_order: i64,
    pub rating: RatingSummary,
    pub approval_status: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub is_available: bool,
    pub daily_order_cap: Option<i32>,
    pub daily_orders: i32,
    pub rating: RatingSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sparse map of status -> timestamp. `placed_at` is always present; every
/// other slot is written exactly once, the first time that status is entered.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Timeline {
    pub placed_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub delivering_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentInfo {
    pub method: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryInfo {
    pub fulfillment: String,
    pub address: Option<serde_json::Value>,
    pub instructions: Option<String>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub estimated_delivery: DateTime<Utc>,
    pub actual_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderRating {
    pub food: i16,
    pub delivery: i16,
    pub overall: i16,
    pub comment: Option<String>,
    pub rated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Cancellation {
    pub reason: String,
    pub cancelled_by: String,
    pub refund_amount: i64,
    pub refund_status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub status: OrderStatus,
    pub pricing: Pricing,
    pub payment: PaymentInfo,
    pub delivery: DeliveryInfo,
    pub timeline: Timeline,
    pub rating: Option<OrderRating>,
    pub cancellation: Option<Cancellation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_entity(model: entity::users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl Vendor {
    pub fn from_entity(model: entity::vendors::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            business_name: model.business_name,
            description: model.description,
            delivery_fee: model.delivery_fee,
            minimum_order: model.minimum_order,
            rating: RatingSummary {
                average: model.rating_average,
                count: model.rating_count,
            },
            approval_status: model.approval_status,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl Product {
    pub fn from_entity(model: entity::products::Model) -> Self {
        Self {
            id: model.id,
            vendor_id: model.vendor_id,
            name: model.name,
            description: model.description,
            price: model.price,
            is_available: model.is_available,
            daily_order_cap: model.daily_order_cap,
            daily_orders: model.daily_orders,
            rating: RatingSummary {
                average: model.rating_average,
                count: model.rating_count,
            },
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl Order {
    /// Regroups the flat row into the nested API shape. Fails only on a
    /// corrupt status column, which indicates a bug or manual data edit.
    pub fn from_entity(model: entity::orders::Model) -> anyhow::Result<Self> {
        let status: OrderStatus = model
            .status
            .parse()
            .with_context(|| format!("order {} has invalid status", model.id))?;

        let to_utc = |dt: Option<sea_orm::prelude::DateTimeWithTimeZone>| {
            dt.map(|d| d.with_timezone(&Utc))
        };

        let rating = match (
            model.rating_food,
            model.rating_delivery,
            model.rating_overall,
            to_utc(model.rated_at),
        ) {
            (Some(food), Some(delivery), Some(overall), Some(rated_at)) => Some(OrderRating {
                food,
                delivery,
                overall,
                comment: model.rating_comment,
                rated_at,
            }),
            _ => None,
        };

        let cancellation = match (
            model.cancel_reason,
            model.cancelled_by,
            model.refund_amount,
            model.refund_status,
        ) {
            (Some(reason), Some(cancelled_by), Some(refund_amount), Some(refund_status)) => {
                Some(Cancellation {
                    reason,
                    cancelled_by,
                    refund_amount,
                    refund_status,
                })
            }
            _ => None,
        };

        Ok(Self {
            id: model.id,
            customer_id: model.customer_id,
            vendor_id: model.vendor_id,
            status,
            pricing: Pricing {
                subtotal: model.subtotal,
                delivery_fee: model.delivery_fee,
                service_fee: model.service_fee,
                taxes: model.taxes,
                total: model.total,
            },
            payment: PaymentInfo {
                method: model.payment_method,
                status: model.payment_status,
            },
            delivery: DeliveryInfo {
                fulfillment: model.fulfillment,
                address: model.delivery_address,
                instructions: model.delivery_instructions,
                scheduled_time: to_utc(model.scheduled_time),
                estimated_delivery: model.estimated_delivery.with_timezone(&Utc),
                actual_delivery: to_utc(model.actual_delivery),
            },
            timeline: Timeline {
                placed_at: model.placed_at.with_timezone(&Utc),
                confirmed_at: to_utc(model.confirmed_at),
                preparing_at: to_utc(model.preparing_at),
                ready_at: to_utc(model.ready_at),
                delivering_at: to_utc(model.delivering_at),
                delivered_at: to_utc(model.delivered_at),
                cancelled_at: to_utc(model.cancelled_at),
            },
            rating,
            cancellation,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

impl OrderItem {
    pub fn from_entity(model: entity::order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
            special_instructions: model.special_instructions,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
