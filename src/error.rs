use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::lifecycle::OrderStatus;
use crate::domain::pricing::PricingError;
use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Vendor {0} is not accepting orders")]
    VendorUnavailable(Uuid),

    #[error("Product {0} is not available from this vendor")]
    ProductUnavailable(Uuid),

    #[error("Order {order_id}: cannot transition from {from} to {to}")]
    InvalidTransition {
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order {order_id} is {status}, only delivered orders can be rated")]
    NotDeliverable {
        order_id: Uuid,
        status: OrderStatus,
    },

    #[error("Order {0} has already been rated")]
    AlreadyRated(Uuid),

    #[error("Concurrent modification, retry the operation")]
    ConcurrentModification,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Pricing(_) | AppError::NotDeliverable { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::VendorUnavailable(_) | AppError::ProductUnavailable(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::InvalidTransition { .. }
            | AppError::AlreadyRated(_)
            | AppError::ConcurrentModification => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
