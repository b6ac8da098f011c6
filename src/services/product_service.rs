use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::vendor_service::vendor_for_user,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(vendor_id) = query.vendor_id {
        condition = condition.add(Column::VendorId.eq(vendor_id));
    }

    if query.available_only.unwrap_or(false) {
        condition = condition.add(Column::IsAvailable.eq(true));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Rating => Column::RatingAverage,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Product::from_entity)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", result, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let vendor = vendor_for_user(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::Forbidden)?;

    if payload.price < 0 {
        return Err(AppError::BadRequest("price cannot be negative".into()));
    }
    if payload.daily_order_cap.is_some_and(|cap| cap < 1) {
        return Err(AppError::BadRequest(
            "daily_order_cap must be at least 1".into(),
        ));
    }

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(vendor.id),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        is_available: Set(payload.is_available.unwrap_or(true)),
        daily_order_cap: Set(payload.daily_order_cap),
        daily_orders: Set(0),
        rating_average: Set(0.0),
        rating_count: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        state,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        Product::from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = owned_product(state, user, id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price cannot be negative".into()));
        }
        // Live price change; existing orders keep their snapshots.
        active.price = Set(price);
    }
    if let Some(is_available) = payload.is_available {
        active.is_available = Set(is_available);
    }
    if let Some(cap) = payload.daily_order_cap {
        if cap < 1 {
            return Err(AppError::BadRequest(
                "daily_order_cap must be at least 1".into(),
            ));
        }
        active.daily_order_cap = Set(Some(cap));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        state,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        Product::from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = owned_product(state, user, id).await?;
    Products::delete_by_id(existing.id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        state,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Fetch a product and check the caller controls it (owning chef or admin).
async fn owned_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ProductModel> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if user.role == "admin" {
        return Ok(product);
    }
    let vendor = vendor_for_user(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::Forbidden)?;
    if vendor.id != product.vendor_id {
        return Err(AppError::Forbidden);
    }
    Ok(product)
}
