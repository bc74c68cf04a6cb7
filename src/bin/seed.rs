use rust_decimal::Decimal;
use storefront_orders::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    services::auth_service::hash_password,
};
use uuid::Uuid;

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    weight: &'static str,
    price_cents: i64,
    sale_price_cents: Option<i64>,
    is_hit: bool,
    is_recommended: bool,
    quantity: i32,
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Axum Hoodie",
        description: "Warm hoodie for Rustaceans",
        weight: "650 g",
        price_cents: 5500,
        sale_price_cents: Some(4400),
        is_hit: true,
        is_recommended: false,
        quantity: 50,
    },
    SeedProduct {
        name: "Ferris Mug",
        description: "Coffee tastes better with Ferris",
        weight: "350 g",
        price_cents: 1200,
        sale_price_cents: None,
        is_hit: true,
        is_recommended: true,
        quantity: 100,
    },
    SeedProduct {
        name: "Rust Sticker Pack",
        description: "Decorate your laptop",
        weight: "20 g",
        price_cents: 500,
        sale_price_cents: None,
        is_hit: false,
        is_recommended: false,
        quantity: 200,
    },
    SeedProduct {
        name: "Borrow Checker Plush",
        description: "Soft, but strict",
        weight: "300 g",
        price_cents: 2500,
        sale_price_cents: Some(1999),
        is_hit: false,
        is_recommended: true,
        quantity: 4,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "user@example.com", "customer", "user123", "user").await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    username: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, username, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for product in PRODUCTS {
        let sale_price = product.sale_price_cents.map(|c| Decimal::new(c, 2));
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, description, weight, price, sale_price, is_sale, is_hit,
                 is_recommended, quantity, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product.name)
        .bind(product.description)
        .bind(product.weight)
        .bind(Decimal::new(product.price_cents, 2))
        .bind(sale_price)
        .bind(sale_price.is_some())
        .bind(product.is_hit)
        .bind(product.is_recommended)
        .bind(product.quantity)
        .bind(product.quantity > 0)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
