use chef_market_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    domain::lifecycle::{CancelledBy, OrderStatus, PaymentMethod},
    dto::orders::{
        CreateOrderRequest, DeliveryRequest, Fulfillment, OrderItemRequest, RateOrderRequest,
        UpdateOrderStatusRequest,
    },
    entity::{
        products::{ActiveModel as ProductActive, Entity as Products},
        users::ActiveModel as UserActive,
        vendors::{ActiveModel as VendorActive, Entity as Vendors},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::order_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use std::sync::OnceLock;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

// Both flows truncate the same database, so they take turns.
static DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

async fn db_guard() -> MutexGuard<'static, ()> {
    DB_LOCK.get_or_init(|| Mutex::new(())).lock().await
}

// Integration flow: customer places an order, chef walks it through the
// lifecycle, customer rates it once and only once.
#[tokio::test]
async fn order_lifecycle_and_rating_flow() -> anyhow::Result<()> {
    let Some(database_url) = test_database_url() else {
        return Ok(());
    };
    let _guard = db_guard().await;
    let state = setup_state(&database_url).await?;

    let fixture = seed_marketplace(&state).await?;
    let customer = AuthUser {
        user_id: fixture.customer_id,
        role: "customer".into(),
    };
    let chef = AuthUser {
        user_id: fixture.chef_id,
        role: "chef".into(),
    };

    // 2 x 1000 + 1 x 500 with a 300 delivery fee:
    // subtotal 2500, service 125, taxes 234, total 3159.
    let created = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            vendor_id: fixture.vendor_id,
            items: vec![
                OrderItemRequest {
                    product_id: fixture.lasagna_id,
                    quantity: 2,
                    special_instructions: None,
                },
                OrderItemRequest {
                    product_id: fixture.tiramisu_id,
                    quantity: 1,
                    special_instructions: Some("extra cocoa".into()),
                },
            ],
            delivery: DeliveryRequest {
                fulfillment: Fulfillment::Delivery,
                address: Some(serde_json::json!({ "street": "1 Test Lane" })),
                scheduled_time: None,
                instructions: None,
            },
            payment_method: PaymentMethod::Card,
        },
    )
    .await?;
    let order = created.data.unwrap().order;

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.pricing.subtotal, 2500);
    assert_eq!(order.pricing.delivery_fee, 300);
    assert_eq!(order.pricing.service_fee, 125);
    assert_eq!(order.pricing.taxes, 234);
    assert_eq!(order.pricing.total, 3159);
    assert!(order.timeline.confirmed_at.is_none());

    // Daily counters are advisory but the bump itself must land.
    let lasagna = Products::find_by_id(fixture.lasagna_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(lasagna.daily_orders, 2);

    // Stage skipping is rejected.
    let skipped = order_service::transition_order(
        &state,
        &chef,
        order.id,
        status_request("delivering"),
    )
    .await;
    assert!(matches!(
        skipped,
        Err(AppError::InvalidTransition { .. })
    ));

    // Rating before delivery is rejected.
    let early = order_service::submit_rating(&state, &customer, order.id, rating_request(5, 4, 4))
        .await;
    assert!(matches!(early, Err(AppError::NotDeliverable { .. })));

    // Walk the happy path to delivered; every successful transition must
    // publish an event, rejected ones above must not have.
    let mut events = state.events.subscribe();
    for status in ["confirmed", "preparing", "ready", "delivering", "delivered"] {
        order_service::transition_order(&state, &chef, order.id, status_request(status)).await?;
    }

    let expected = [
        (OrderStatus::Pending, OrderStatus::Confirmed),
        (OrderStatus::Confirmed, OrderStatus::Preparing),
        (OrderStatus::Preparing, OrderStatus::Ready),
        (OrderStatus::Ready, OrderStatus::Delivering),
        (OrderStatus::Delivering, OrderStatus::Delivered),
    ];
    for (from, to) in expected {
        let event = events.try_recv().expect("transition event");
        assert_eq!(event.order_id, order.id);
        assert_eq!(event.from_status, from);
        assert_eq!(event.to_status, to);
    }
    assert!(events.try_recv().is_err(), "no extra events expected");

    let delivered = order_service::get_order(&state, &customer, order.id)
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert!(delivered.timeline.delivered_at.is_some());
    assert!(delivered.delivery.actual_delivery.is_some());

    // First rating folds into the vendor (overall) and product (food) stats.
    let rated = order_service::submit_rating(&state, &customer, order.id, rating_request(5, 4, 4))
        .await?
        .data
        .unwrap();
    let rating = rated.rating.expect("order rating");
    assert_eq!(rating.food, 5);
    assert_eq!(rating.overall, 4);

    let vendor = Vendors::find_by_id(fixture.vendor_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(vendor.rating_count, 1);
    assert_eq!(vendor.rating_average, 4.0);

    let lasagna = Products::find_by_id(fixture.lasagna_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(lasagna.rating_count, 1);
    assert_eq!(lasagna.rating_average, 5.0);

    // Second rating is rejected and the stats stay put.
    let again = order_service::submit_rating(&state, &customer, order.id, rating_request(1, 1, 1))
        .await;
    assert!(matches!(again, Err(AppError::AlreadyRated(_))));

    let vendor = Vendors::find_by_id(fixture.vendor_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(vendor.rating_count, 1);

    Ok(())
}

#[tokio::test]
async fn cancellation_before_preparing_refunds_in_full() -> anyhow::Result<()> {
    let Some(database_url) = test_database_url() else {
        return Ok(());
    };
    let _guard = db_guard().await;
    let state = setup_state(&database_url).await?;

    let fixture = seed_marketplace(&state).await?;
    let customer = AuthUser {
        user_id: fixture.customer_id,
        role: "customer".into(),
    };

    let created = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            vendor_id: fixture.vendor_id,
            items: vec![OrderItemRequest {
                product_id: fixture.tiramisu_id,
                quantity: 1,
                special_instructions: None,
            }],
            delivery: DeliveryRequest {
                fulfillment: Fulfillment::Pickup,
                address: None,
                scheduled_time: None,
                instructions: None,
            },
            payment_method: PaymentMethod::Cash,
        },
    )
    .await?;
    let order = created.data.unwrap().order;

    // Customers may cancel their own pending order; before preparing the
    // refund is the full total.
    let cancelled = order_service::transition_order(
        &state,
        &customer,
        order.id,
        UpdateOrderStatusRequest {
            status: "cancelled".into(),
            reason: Some("changed my mind".into()),
            cancelled_by: Some(CancelledBy::Customer),
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.timeline.cancelled_at.is_some());
    let cancellation = cancelled.cancellation.expect("cancellation details");
    assert_eq!(cancellation.refund_amount, order.pricing.total);
    assert_eq!(cancellation.cancelled_by, "customer");

    // Terminal states admit no further transitions.
    let revived = order_service::transition_order(
        &state,
        &customer,
        order.id,
        UpdateOrderStatusRequest {
            status: "cancelled".into(),
            reason: Some("again".into()),
            cancelled_by: Some(CancelledBy::Customer),
        },
    )
    .await;
    assert!(matches!(revived, Err(AppError::InvalidTransition { .. })));

    Ok(())
}

fn test_database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            None
        }
    }
}

fn status_request(status: &str) -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest {
        status: status.into(),
        reason: None,
        cancelled_by: None,
    }
}

fn rating_request(food: u8, delivery: u8, overall: u8) -> RateOrderRequest {
    RateOrderRequest {
        food,
        delivery,
        overall,
        comment: None,
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, products, vendors, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState::new(pool, orm))
}

struct MarketplaceFixture {
    customer_id: Uuid,
    chef_id: Uuid,
    vendor_id: Uuid,
    lasagna_id: Uuid,
    tiramisu_id: Uuid,
}

async fn seed_marketplace(state: &AppState) -> anyhow::Result<MarketplaceFixture> {
    let customer_id = create_user(state, "customer", "customer@example.com").await?;
    let chef_id = create_user(state, "chef", "chef@example.com").await?;

    let vendor = VendorActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(chef_id),
        business_name: Set("Test Kitchen".into()),
        description: Set(None),
        delivery_fee: Set(300),
        minimum_order: Set(0),
        rating_average: Set(0.0),
        rating_count: Set(0),
        approval_status: Set("approved".into()),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let lasagna_id = create_product(state, vendor.id, "Lasagna", 1000).await?;
    let tiramisu_id = create_product(state, vendor.id, "Tiramisu", 500).await?;

    Ok(MarketplaceFixture {
        customer_id,
        chef_id,
        vendor_id: vendor.id,
        lasagna_id,
        tiramisu_id,
    })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_product(
    state: &AppState,
    vendor_id: Uuid,
    name: &str,
    price: i64,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(vendor_id),
        name: Set(name.into()),
        description: Set(None),
        price: Set(price),
        is_available: Set(true),
        daily_order_cap: Set(None),
        daily_orders: Set(0),
        rating_average: Set(0.0),
        rating_count: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}
