use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{
        lifecycle::{OrderStatus, RefundPolicy, RefundStatus},
        pricing::{self, LineItem, PricingError, PricingRates},
        rating::{self, RatingAggregate},
    },
    dto::orders::{
        CreateOrderRequest, Fulfillment, OrderList, OrderWithItems, RateOrderRequest,
        UpdateOrderStatusRequest,
    },
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        vendors::{Column as VendorCol, Entity as Vendors},
    },
    error::{AppError, AppResult},
    events,
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

// Placeholder ETA, not a routed estimate.
const ESTIMATED_DELIVERY_OFFSET_MINS: i64 = 60;

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(PricingError::EmptyOrder.into());
    }
    if matches!(payload.delivery.fulfillment, Fulfillment::Delivery)
        && payload.delivery.address.is_none()
    {
        return Err(AppError::BadRequest(
            "delivery orders require an address".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let vendor = Vendors::find_by_id(payload.vendor_id)
        .one(&txn)
        .await?
        .ok_or(AppError::VendorUnavailable(payload.vendor_id))?;
    if vendor.approval_status != "approved" || !vendor.is_active {
        return Err(AppError::VendorUnavailable(vendor.id));
    }

    // Lock the product rows so the snapshot prices cannot shift mid-checkout.
    let product_ids: Vec<Uuid> = payload.items.iter().map(|i| i.product_id).collect();
    let products: BTreeMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .filter(ProdCol::VendorId.eq(vendor.id))
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut line_items = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        let product = products
            .get(&item.product_id)
            .ok_or(AppError::ProductUnavailable(item.product_id))?;
        if !product.is_available {
            return Err(AppError::ProductUnavailable(product.id));
        }
        line_items.push(LineItem {
            unit_price: product.price,
            quantity: item.quantity,
        });
    }

    let pricing =
        pricing::compute_pricing(&line_items, vendor.delivery_fee, PricingRates::default())?;

    let now = Utc::now();
    let order_id = Uuid::new_v4();

    let order = OrderActive {
        id: Set(order_id),
        customer_id: Set(user.user_id),
        vendor_id: Set(vendor.id),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        subtotal: Set(pricing.subtotal),
        delivery_fee: Set(pricing.delivery_fee),
        service_fee: Set(pricing.service_fee),
        taxes: Set(pricing.taxes),
        total: Set(pricing.total),
        payment_method: Set(payload.payment_method.as_str().to_string()),
        payment_status: Set("pending".to_string()),
        fulfillment: Set(payload.delivery.fulfillment.as_str().to_string()),
        delivery_address: Set(payload.delivery.address),
        delivery_instructions: Set(payload.delivery.instructions),
        scheduled_time: Set(payload.delivery.scheduled_time.map(Into::into)),
        estimated_delivery: Set(
            (now + Duration::minutes(ESTIMATED_DELIVERY_OFFSET_MINS)).into()
        ),
        actual_delivery: Set(None),
        placed_at: Set(now.into()),
        confirmed_at: Set(None),
        preparing_at: Set(None),
        ready_at: Set(None),
        delivering_at: Set(None),
        delivered_at: Set(None),
        cancelled_at: Set(None),
        rating_food: Set(None),
        rating_delivery: Set(None),
        rating_overall: Set(None),
        rating_comment: Set(None),
        rated_at: Set(None),
        cancel_reason: Set(None),
        cancelled_by: Set(None),
        refund_amount: Set(None),
        refund_status: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(payload.items.len());
    for (item, line) in payload.items.iter().zip(&line_items) {
        let saved = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            special_instructions: Set(item.special_instructions.clone()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from_entity(saved));
    }

    txn.commit().await?;

    // Advisory counters only; a failed bump never fails the order.
    for item in &items {
        let bump = Products::update_many()
            .col_expr(
                ProdCol::DailyOrders,
                Expr::col(ProdCol::DailyOrders).add(item.quantity),
            )
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(&state.orm)
            .await;
        if let Err(err) = bump {
            tracing::warn!(error = %err, product_id = %item.product_id, "daily counter bump failed");
        }
    }

    if let Err(err) = log_audit(
        state,
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": order.total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: Order::from_entity(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn transition_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let target: OrderStatus = payload
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown order status: {}", payload.status)))?;

    let txn = state.orm.begin().await?;

    // Row lock is the compare-and-set: the status read below cannot be
    // overtaken by a concurrent transition on the same order.
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    authorize_transition(&txn, user, &existing, target).await?;

    let current: OrderStatus = existing
        .status
        .parse()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("order {} has invalid status", id)))?;

    if !current.can_transition(target) {
        return Err(AppError::InvalidTransition {
            order_id: id,
            from: current,
            to: target,
        });
    }

    let now = Utc::now();
    let mut active: OrderActive = existing.clone().into();
    active.status = Set(target.as_str().to_string());
    active.updated_at = Set(now.into());

    // Each timeline slot is written the first time its status is entered.
    match target {
        OrderStatus::Confirmed if existing.confirmed_at.is_none() => {
            active.confirmed_at = Set(Some(now.into()));
        }
        OrderStatus::Preparing if existing.preparing_at.is_none() => {
            active.preparing_at = Set(Some(now.into()));
        }
        OrderStatus::Ready if existing.ready_at.is_none() => {
            active.ready_at = Set(Some(now.into()));
        }
        OrderStatus::Delivering if existing.delivering_at.is_none() => {
            active.delivering_at = Set(Some(now.into()));
        }
        OrderStatus::Delivered => {
            if existing.delivered_at.is_none() {
                active.delivered_at = Set(Some(now.into()));
            }
            if existing.actual_delivery.is_none() {
                active.actual_delivery = Set(Some(now.into()));
            }
        }
        OrderStatus::Cancelled => {
            let reason = payload
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| AppError::BadRequest("cancellation requires a reason".into()))?;
            let cancelled_by = payload.cancelled_by.ok_or_else(|| {
                AppError::BadRequest("cancellation requires cancelled_by".into())
            })?;

            let refund = RefundPolicy::default().refund_amount(current, existing.total);
            if existing.cancelled_at.is_none() {
                active.cancelled_at = Set(Some(now.into()));
            }
            active.cancel_reason = Set(Some(reason.to_string()));
            active.cancelled_by = Set(Some(cancelled_by.as_str().to_string()));
            active.refund_amount = Set(Some(refund));
            active.refund_status = Set(Some(RefundStatus::Pending.as_str().to_string()));
        }
        _ => {}
    }

    let order = active.update(&txn).await?;
    txn.commit().await?;

    events::emit_transition(&state.events, order.id, current, target, now);

    if let Err(err) = log_audit(
        state,
        Some(user.user_id),
        "order_transition",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "from": current.as_str(),
            "to": target.as_str(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order status updated",
        Order::from_entity(order)?,
        Some(Meta::empty()),
    ))
}

pub async fn submit_rating(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    for (name, score) in [
        ("food", payload.food),
        ("delivery", payload.delivery),
        ("overall", payload.overall),
    ] {
        if !(1..=5).contains(&score) {
            return Err(AppError::BadRequest(format!(
                "{name} rating must be between 1 and 5"
            )));
        }
    }

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.customer_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let status: OrderStatus = existing
        .status
        .parse()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("order {} has invalid status", id)))?;
    if status != OrderStatus::Delivered {
        return Err(AppError::NotDeliverable {
            order_id: id,
            status,
        });
    }
    if existing.rated_at.is_some() {
        return Err(AppError::AlreadyRated(id));
    }

    // Conditional write keeps the rating exactly-once even when two
    // submissions race past the check above.
    let now = Utc::now();
    let written = Orders::update_many()
        .col_expr(OrderCol::RatingFood, Expr::value(payload.food as i16))
        .col_expr(OrderCol::RatingDelivery, Expr::value(payload.delivery as i16))
        .col_expr(OrderCol::RatingOverall, Expr::value(payload.overall as i16))
        .col_expr(OrderCol::RatingComment, Expr::value(payload.comment.clone()))
        .col_expr(OrderCol::RatedAt, Expr::value(now))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now))
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::RatedAt.is_null())
        .exec(&state.orm)
        .await?;
    if written.rows_affected == 0 {
        return Err(AppError::AlreadyRated(id));
    }

    // Vendor folds the overall score; each distinct product folds the food
    // score, one vote per product regardless of quantity. These writes are
    // not transactional with the order's rating: a failure here leaves the
    // rating in place and only the statistics lagging.
    let mut lagging = false;

    if let Err(err) = fold_vendor_rating(&state.orm, existing.vendor_id, payload.overall).await {
        tracing::warn!(error = %err, vendor_id = %existing.vendor_id, "vendor aggregate update failed");
        lagging = true;
    }

    let mut product_ids: Vec<Uuid> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|item| item.product_id)
        .collect();
    product_ids.sort();
    product_ids.dedup();

    for product_id in product_ids {
        if let Err(err) = fold_product_rating(&state.orm, product_id, payload.food).await {
            tracing::warn!(error = %err, product_id = %product_id, "product aggregate update failed");
            lagging = true;
        }
    }

    if let Err(err) = log_audit(
        state,
        Some(user.user_id),
        "order_rated",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id, "overall": payload.overall })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let message = if lagging {
        "Rating recorded, statistics may lag"
    } else {
        "Rating submitted"
    };
    Ok(ApiResponse::success(
        message,
        Order::from_entity(order)?,
        Some(Meta::empty()),
    ))
}

/// Read-fold-CAS on the vendor aggregate; one retry, then the caller may
/// retry the whole submission.
async fn fold_vendor_rating<C: ConnectionTrait>(
    conn: &C,
    vendor_id: Uuid,
    value: u8,
) -> AppResult<()> {
    for _ in 0..2 {
        let vendor = Vendors::find_by_id(vendor_id)
            .one(conn)
            .await?
            .ok_or(AppError::NotFound)?;
        let next = rating::fold(
            RatingAggregate {
                average: vendor.rating_average,
                count: vendor.rating_count,
            },
            value,
        );
        let result = Vendors::update_many()
            .col_expr(VendorCol::RatingAverage, Expr::value(next.average))
            .col_expr(VendorCol::RatingCount, Expr::value(next.count))
            .filter(VendorCol::Id.eq(vendor_id))
            .filter(VendorCol::RatingCount.eq(vendor.rating_count))
            .exec(conn)
            .await?;
        if result.rows_affected > 0 {
            return Ok(());
        }
    }
    Err(AppError::ConcurrentModification)
}

async fn fold_product_rating<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    value: u8,
) -> AppResult<()> {
    for _ in 0..2 {
        let product = Products::find_by_id(product_id)
            .one(conn)
            .await?
            .ok_or(AppError::NotFound)?;
        let next = rating::fold(
            RatingAggregate {
                average: product.rating_average,
                count: product.rating_count,
            },
            value,
        );
        let result = Products::update_many()
            .col_expr(ProdCol::RatingAverage, Expr::value(next.average))
            .col_expr(ProdCol::RatingCount, Expr::value(next.count))
            .filter(ProdCol::Id.eq(product_id))
            .filter(ProdCol::RatingCount.eq(product.rating_count))
            .exec(conn)
            .await?;
        if result.rows_affected > 0 {
            return Ok(());
        }
    }
    Err(AppError::ConcurrentModification)
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    match user.role.as_str() {
        "admin" => {}
        "chef" => {
            let vendor = Vendors::find()
                .filter(VendorCol::UserId.eq(user.user_id))
                .one(&state.orm)
                .await?
                .ok_or(AppError::Forbidden)?;
            condition = condition.add(OrderCol::VendorId.eq(vendor.id));
        }
        _ => condition = condition.add(OrderCol::CustomerId.eq(user.user_id)),
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
        "Ok",
        OrderList { items },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let allowed = match user.role.as_str() {
        "admin" => true,
        "chef" => {
            let vendor = Vendors::find()
                .filter(VendorCol::UserId.eq(user.user_id))
                .one(&state.orm)
                .await?;
            vendor.is_some_and(|v| v.id == order.vendor_id)
        }
        _ => order.customer_id == user.user_id,
    };
    if !allowed {
        return Err(AppError::Forbidden);
    }

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

async fn authorize_transition<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    order: &crate::entity::orders::Model,
    target: OrderStatus,
) -> AppResult<()> {
    match user.role.as_str() {
        "admin" => Ok(()),
        "chef" => {
            let vendor = Vendors::find_by_id(order.vendor_id)
                .one(conn)
                .await?
                .ok_or(AppError::Forbidden)?;
            if vendor.user_id == user.user_id {
                Ok(())
            } else {
                Err(AppError::Forbidden)
            }
        }
        // Customers can only cancel, and only their own orders.
        _ => {
            if order.customer_id == user.user_id && target == OrderStatus::Cancelled {
                Ok(())
            } else {
                Err(AppError::Forbidden)
            }
        }
    }
}
