use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::lifecycle::OrderStatus,
    dto::{
        orders::{OrderList, OrderWithItems},
        vendors::{ReviewVendorRequest, VendorList},
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        users::{Column as UserCol, Entity as Users},
        vendors::{ActiveModel as VendorActive, Column as VendorCol, Entity as Vendors},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, Vendor},
    response::{ApiResponse, Meta},
    routes::params::{AdminOrderListQuery, SortOrder},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStats {
    pub total: i64,
    pub customers: i64,
    pub chefs: i64,
    pub admins: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VendorStats {
    pub total: i64,
    pub approved: i64,
    pub pending: i64,
    pub active: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductStats {
    pub total: i64,
    pub available: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStats {
    pub total: i64,
    pub pending: i64,
    pub delivered: i64,
    pub cancelled: i64,
    pub last_thirty_days: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevenueStats {
    /// Sum of delivered order totals, cents.
    pub total: i64,
    pub average_order_value: i64,
}

/// Read-only dashboard rollup; consumes the core, never mutates it.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlatformStats {
    pub users: UserStats,
    pub vendors: VendorStats,
    pub products: ProductStats,
    pub orders: OrderStats,
    pub revenue: RevenueStats,
}

pub async fn platform_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<PlatformStats>> {
    ensure_admin(user)?;
    let orm = &state.orm;

    let count_users = |role: &str| {
        Users::find()
            .filter(UserCol::Role.eq(role.to_string()))
            .count(orm)
    };
    let count_orders = |status: OrderStatus| {
        Orders::find()
            .filter(OrderCol::Status.eq(status.as_str()))
            .count(orm)
    };

    let users = UserStats {
        total: Users::find().count(orm).await? as i64,
        customers: count_users("customer").await? as i64,
        chefs: count_users("chef").await? as i64,
        admins: count_users("admin").await? as i64,
    };

    let vendors = VendorStats {
        total: Vendors::find().count(orm).await? as i64,
        approved: Vendors::find()
            .filter(VendorCol::ApprovalStatus.eq("approved"))
            .count(orm)
            .await? as i64,
        pending: Vendors::find()
            .filter(VendorCol::ApprovalStatus.eq("pending"))
            .count(orm)
            .await? as i64,
        active: Vendors::find()
            .filter(VendorCol::IsActive.eq(true))
            .count(orm)
            .await? as i64,
    };

    let products = ProductStats {
        total: Products::find().count(orm).await? as i64,
        available: Products::find()
            .filter(ProdCol::IsAvailable.eq(true))
            .count(orm)
            .await? as i64,
    };

    let thirty_days_ago = Utc::now() - Duration::days(30);
    let orders = OrderStats {
        total: Orders::find().count(orm).await? as i64,
        pending: count_orders(OrderStatus::Pending).await? as i64,
        delivered: count_orders(OrderStatus::Delivered).await? as i64,
        cancelled: count_orders(OrderStatus::Cancelled).await? as i64,
        last_thirty_days: Orders::find()
            .filter(OrderCol::PlacedAt.gte(thirty_days_ago))
            .count(orm)
            .await? as i64,
    };

    let (revenue_total,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total), 0)::BIGINT FROM orders WHERE status = 'delivered'",
    )
    .fetch_one(&state.pool)
    .await?;
    let revenue = RevenueStats {
        total: revenue_total,
        average_order_value: if orders.delivered > 0 {
            revenue_total / orders.delivered
        } else {
            0
        },
    };

    Ok(ApiResponse::success(
        "Platform statistics",
        PlatformStats {
            users,
            vendors,
            products,
            orders,
            revenue,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_pending_vendors(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<VendorList>> {
    ensure_admin(user)?;
    let items = Vendors::find()
        .filter(VendorCol::ApprovalStatus.eq("pending"))
        .order_by_desc(VendorCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Vendor::from_entity)
        .collect();
    Ok(ApiResponse::success(
        "Pending vendors",
        VendorList { items },
        Some(Meta::empty()),
    ))
}

pub async fn review_vendor(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ReviewVendorRequest,
) -> AppResult<ApiResponse<Vendor>> {
    ensure_admin(user)?;
    if payload.decision != "approved" && payload.decision != "rejected" {
        return Err(AppError::BadRequest(
            "decision must be approved or rejected".into(),
        ));
    }

    let existing = Vendors::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: VendorActive = existing.into();
    active.approval_status = Set(payload.decision.clone());
    active.updated_at = Set(Utc::now().into());
    let vendor = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        state,
        Some(user.user_id),
        "vendor_review",
        Some("vendors"),
        Some(serde_json::json!({ "vendor_id": vendor.id, "decision": payload.decision })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Vendor reviewed",
        Vendor::from_entity(vendor),
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: AdminOrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(customer_id) = query.customer_id {
        condition = condition.add(OrderCol::CustomerId.eq(customer_id));
    }
    if let Some(vendor_id) = query.vendor_id {
        condition = condition.add(OrderCol::VendorId.eq(vendor_id));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Unknown order status: {status}")))?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::PlacedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::PlacedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from_entity)
        .collect::<Result<Vec<_>, _>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(meta),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: Order::from_entity(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}
