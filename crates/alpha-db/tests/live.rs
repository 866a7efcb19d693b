//! Live integration tests for alpha-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh Postgres database with the catalog schema applied
//! by the sqlx test harness. `"../../migrations"` resolves to the workspace
//! schema directory.

use alpha_core::{Category, Color, Product, ProductVariant, Size};
use alpha_db::{
    insert_variant, load_categories, load_colors, load_sizes, load_variants_isolated,
    stage_products, staged_product_ids,
};
use sqlx::PgConnection;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn product(id: &str) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        brand: Some("Acme".to_string()),
        description: None,
        category_id: Some("cat1".to_string()),
    }
}

fn variant(n: u128, product_id: &str) -> ProductVariant {
    ProductVariant {
        id: Uuid::from_u128(n),
        product_id: product_id.to_string(),
        color_id: Some("red".to_string()),
        image_name: format!("images/products/{n}.png"),
        size_id: Some("m".to_string()),
        price: 42,
    }
}

/// Loads one category, two colors, two sizes and products `p1`..`p3`.
async fn seed_reference(conn: &mut PgConnection) {
    load_categories(
        conn,
        &[Category {
            id: "cat1".to_string(),
            name: "Tops".to_string(),
            description: None,
        }],
    )
    .await
    .expect("load_categories failed");

    load_colors(
        conn,
        &[
            Color {
                id: "red".to_string(),
                name: "Red".to_string(),
                hex: Some("#FF0000".to_string()),
            },
            Color {
                id: "blue".to_string(),
                name: "Blue".to_string(),
                hex: None,
            },
        ],
    )
    .await
    .expect("load_colors failed");

    load_sizes(
        conn,
        &[
            Size {
                id: "m".to_string(),
                label: "M".to_string(),
            },
            Size {
                id: "l".to_string(),
                label: "L".to_string(),
            },
        ],
    )
    .await
    .expect("load_sizes failed");

    stage_products(conn, &[product("p1"), product("p2"), product("p3")], 100)
        .await
        .expect("stage_products failed");
}

async fn variant_count(conn: &mut PgConnection) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM product_variants")
        .fetch_one(&mut *conn)
        .await
        .expect("count query failed")
}

// ---------------------------------------------------------------------------
// Reference loads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn stage_products_loads_only_the_prefix(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    load_categories(
        &mut conn,
        &[Category {
            id: "cat1".to_string(),
            name: "Tops".to_string(),
            description: Some("Shirts and such".to_string()),
        }],
    )
    .await
    .unwrap();

    let products: Vec<Product> = (1..=5).map(|n| product(&format!("p{n}"))).collect();
    let inserted = stage_products(&mut conn, &products, 2).await.unwrap();
    assert_eq!(inserted, 2);

    let ids = staged_product_ids(&mut conn).await.unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains("p1"));
    assert!(ids.contains("p2"));
    assert!(!ids.contains("p3"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn reference_loads_tolerate_rerun(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    seed_reference(&mut conn).await;

    let again = stage_products(&mut conn, &[product("p1")], 100)
        .await
        .expect("re-staging an existing product must not fail");
    assert_eq!(again, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn staged_ids_include_products_from_earlier_runs(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    seed_reference(&mut conn).await;

    let products: Vec<Product> = (1..=5).map(|n| product(&format!("p{n}"))).collect();
    let inserted = stage_products(&mut conn, &products, 1).await.unwrap();
    assert_eq!(inserted, 0, "p1 was already staged");

    let ids = staged_product_ids(&mut conn).await.unwrap();
    let mut sorted: Vec<&str> = ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    assert_eq!(sorted, vec!["p1", "p2", "p3"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn staged_ids_empty_on_fresh_database(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    let ids = staged_product_ids(&mut conn).await.unwrap();
    assert!(ids.is_empty());
}

// ---------------------------------------------------------------------------
// Variant loads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn insert_variant_binds_absent_optionals_as_null(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    seed_reference(&mut conn).await;

    let mut row = variant(1, "p1");
    row.color_id = None;
    row.size_id = None;
    insert_variant(&mut conn, &row).await.unwrap();

    let (color_id, size_id): (Option<String>, Option<String>) =
        sqlx::query_as("SELECT color_id, size_id FROM product_variants WHERE id = $1")
            .bind(row.id)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
    assert!(color_id.is_none(), "color_id should be NULL, got {color_id:?}");
    assert!(size_id.is_none(), "size_id should be NULL, got {size_id:?}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn foreign_key_violation_on_third_row_is_isolated(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    seed_reference(&mut conn).await;

    let rows = vec![
        variant(1, "p1"),
        variant(2, "p2"),
        // p99 was never staged: the products FK rejects it.
        variant(3, "p99"),
        variant(4, "p3"),
        variant(5, "p1"),
    ];

    let report = load_variants_isolated(&mut *conn, rows)
        .await
        .expect("a rejected row must not abort the load");

    assert_eq!(report.attempted, 5);
    assert_eq!(report.inserted, 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 2);
    assert_eq!(report.failures[0].variant.product_id, "p99");

    assert_eq!(variant_count(&mut conn).await, 4);
    let missing: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM product_variants WHERE id = $1")
            .bind(Uuid::from_u128(3))
            .fetch_optional(&mut *conn)
            .await
            .unwrap();
    assert!(missing.is_none(), "rejected row must leave nothing behind");
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_surrogate_id_is_isolated(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    seed_reference(&mut conn).await;

    let rows = vec![variant(7, "p1"), variant(7, "p2"), variant(8, "p3")];
    let report = load_variants_isolated(&mut *conn, rows).await.unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(variant_count(&mut conn).await, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_variant_batch_inserts_nothing(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    seed_reference(&mut conn).await;

    let report = load_variants_isolated(&mut *conn, Vec::new()).await.unwrap();

    assert_eq!(report.attempted, 0);
    assert_eq!(variant_count(&mut conn).await, 0);
}
