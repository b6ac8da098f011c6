use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::vendors::{CreateVendorRequest, UpdateVendorRequest},
    entity::{
        users::{ActiveModel as UserActive, Entity as Users},
        vendors::{ActiveModel as VendorActive, Column as VendorCol, Entity as Vendors, Model as VendorModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Vendor,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Resolve the vendor profile owned by a user, if any. One user owns at
/// most one vendor.
pub async fn vendor_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Option<VendorModel>> {
    let vendor = Vendors::find()
        .filter(VendorCol::UserId.eq(user_id))
        .one(conn)
        .await?;
    Ok(vendor)
}

pub async fn create_vendor(
    state: &AppState,
    user: &AuthUser,
    payload: CreateVendorRequest,
) -> AppResult<ApiResponse<Vendor>> {
    if payload.delivery_fee < 0 || payload.minimum_order < 0 {
        return Err(AppError::BadRequest(
            "fees cannot be negative".into(),
        ));
    }
    if vendor_for_user(&state.orm, user.user_id).await?.is_some() {
        return Err(AppError::BadRequest(
            "User already has a vendor profile".into(),
        ));
    }

    let vendor = VendorActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        business_name: Set(payload.business_name),
        description: Set(payload.description),
        delivery_fee: Set(payload.delivery_fee),
        minimum_order: Set(payload.minimum_order),
        rating_average: Set(0.0),
        rating_count: Set(0),
        approval_status: Set("pending".to_string()),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // The owning account becomes a chef; admins keep their role.
    if user.role != "admin" {
        let account = Users::find_by_id(user.user_id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut active: UserActive = account.into();
        active.role = Set("chef".to_string());
        active.update(&state.orm).await?;
    }

    if let Err(err) = log_audit(
        state,
        Some(user.user_id),
        "vendor_create",
        Some("vendors"),
        Some(serde_json::json!({ "vendor_id": vendor.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Vendor profile created, pending approval",
        Vendor::from_entity(vendor),
        Some(Meta::empty()),
    ))
}

pub async fn get_vendor(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Vendor>> {
    let vendor = Vendors::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Vendor",
        Vendor::from_entity(vendor),
        None,
    ))
}

pub async fn my_vendor(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Vendor>> {
    let vendor = vendor_for_user(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Vendor",
        Vendor::from_entity(vendor),
        None,
    ))
}

pub async fn update_vendor(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateVendorRequest,
) -> AppResult<ApiResponse<Vendor>> {
    let existing = vendor_for_user(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: VendorActive = existing.into();
    if let Some(business_name) = payload.business_name {
        active.business_name = Set(business_name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(delivery_fee) = payload.delivery_fee {
        if delivery_fee < 0 {
            return Err(AppError::BadRequest("delivery_fee cannot be negative".into()));
        }
        active.delivery_fee = Set(delivery_fee);
    }
    if let Some(minimum_order) = payload.minimum_order {
        if minimum_order < 0 {
            return Err(AppError::BadRequest("minimum_order cannot be negative".into()));
        }
        active.minimum_order = Set(minimum_order);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let vendor = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        state,
        Some(user.user_id),
        "vendor_update",
        Some("vendors"),
        Some(serde_json::json!({ "vendor_id": vendor.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Vendor updated",
        Vendor::from_entity(vendor),
        Some(Meta::empty()),
    ))
}
