use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chef_market_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    let customer_id = ensure_user(&pool, "customer@example.com", "customer123", "customer").await?;
    let chef_id = ensure_user(&pool, "chef@example.com", "chef123", "chef").await?;

    let vendor_id = ensure_vendor(&pool, chef_id, "Nonna's Kitchen").await?;
    seed_products(&pool, vendor_id).await?;

    println!("Seed completed. Admin: {admin_id}, Customer: {customer_id}, Vendor: {vendor_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_vendor(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    business_name: &str,
) -> anyhow::Result<Uuid> {
    let (vendor_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO vendors (id, user_id, business_name, description, delivery_fee, minimum_order, approval_status, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, 'approved', TRUE)
        ON CONFLICT (user_id) DO UPDATE SET business_name = EXCLUDED.business_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(business_name)
    .bind("Home-made pasta and sauces")
    .bind(300i64)
    .bind(1000i64)
    .fetch_one(pool)
    .await?;

    println!("Ensured vendor {business_name}");
    Ok(vendor_id)
}

async fn seed_products(pool: &sqlx::PgPool, vendor_id: Uuid) -> anyhow::Result<()> {
    let products: Vec<(&str, &str, i64, Option<i32>)> = vec![
        ("Lasagna Tray", "Serves four, baked to order", 2400, Some(8)),
        ("Tagliatelle al Ragu", "Fresh egg pasta, slow-cooked ragu", 1400, Some(15)),
        ("Tiramisu Cup", "Single portion, made daily", 650, None),
        ("Focaccia Loaf", "Rosemary and sea salt", 500, Some(20)),
    ];

    for (name, desc, price, cap) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, vendor_id, name, description, price, daily_order_cap)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (
                SELECT 1 FROM products WHERE vendor_id = $2 AND name = $3
            )
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vendor_id)
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(cap)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
