mod common;

use storefront_orders::db::run_migrations;

use common::setup;

#[tokio::test]
async fn applied_migrations_are_not_replayed() -> anyhow::Result<()> {
    let Some(db) = setup().await? else {
        return Ok(());
    };
    let pool = &db.state.pool;

    run_migrations(pool).await?;
    run_migrations(pool).await?;

    let versions: Vec<(i64,)> =
        sqlx::query_as("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
            .fetch_all(pool)
            .await?;
    let versions: Vec<i64> = versions.into_iter().map(|(v,)| v).collect();
    assert_eq!(versions, vec![1, 2]);
    Ok(())
}

async fn numeric_precision(
    pool: &sqlx::PgPool,
    table: &str,
    column: &str,
) -> anyhow::Result<Option<i32>> {
    let (precision,): (Option<i32>,) = sqlx::query_as(
        r#"
        SELECT numeric_precision::int4
        FROM information_schema.columns
        WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2
        "#,
    )
    .bind(table)
    .bind(column)
    .fetch_one(pool)
    .await?;
    Ok(precision)
}

#[tokio::test]
async fn order_totals_are_wider_than_unit_prices() -> anyhow::Result<()> {
    let Some(db) = setup().await? else {
        return Ok(());
    };
    let pool = &db.state.pool;

    assert_eq!(numeric_precision(pool, "orders", "total").await?, Some(30));
    assert_eq!(numeric_precision(pool, "products", "price").await?, Some(12));
    Ok(())
}
