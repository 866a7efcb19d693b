//! Straight CSV-to-table loads for the reference tables and the staged
//! product subset.
//!
//! Each table is loaded inside its own transaction. Rows whose `id` already
//! exists are left untouched (`ON CONFLICT (id) DO NOTHING`) so the import can
//! be re-run against a seeded database; nothing here ever updates a row.

use std::collections::HashSet;

use alpha_core::{Category, Color, Product, Size};
use sqlx::{Connection, PgConnection};

use crate::DbError;

/// Inserts categories verbatim. Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; the whole table load is
/// rolled back.
pub async fn load_categories(
    conn: &mut PgConnection,
    categories: &[Category],
) -> Result<u64, DbError> {
    let mut tx = conn.begin().await?;
    let mut inserted = 0u64;

    for category in categories {
        inserted += sqlx::query(
            "INSERT INTO categories (id, name, description) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    tracing::info!(rows = categories.len(), inserted, "loaded categories");
    Ok(inserted)
}

/// Inserts colors verbatim. Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; the whole table load is
/// rolled back.
pub async fn load_colors(conn: &mut PgConnection, colors: &[Color]) -> Result<u64, DbError> {
    let mut tx = conn.begin().await?;
    let mut inserted = 0u64;

    for color in colors {
        inserted += sqlx::query(
            "INSERT INTO colors (id, name, hex) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&color.id)
        .bind(&color.name)
        .bind(&color.hex)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    tracing::info!(rows = colors.len(), inserted, "loaded colors");
    Ok(inserted)
}

/// Inserts sizes verbatim. Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; the whole table load is
/// rolled back.
pub async fn load_sizes(conn: &mut PgConnection, sizes: &[Size]) -> Result<u64, DbError> {
    let mut tx = conn.begin().await?;
    let mut inserted = 0u64;

    for size in sizes {
        inserted += sqlx::query(
            "INSERT INTO sizes (id, label) \
             VALUES ($1, $2) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&size.id)
        .bind(&size.label)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    tracing::info!(rows = sizes.len(), inserted, "loaded sizes");
    Ok(inserted)
}

/// Inserts the first `limit` products, in file order. The rest of the
/// catalog is never loaded, so only these products can be referenced by
/// variants.
///
/// Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails (including a `category_id`
/// that does not exist); the whole product load is rolled back.
pub async fn stage_products(
    conn: &mut PgConnection,
    products: &[Product],
    limit: usize,
) -> Result<u64, DbError> {
    let staged = &products[..products.len().min(limit)];
    let mut tx = conn.begin().await?;
    let mut inserted = 0u64;

    for product in staged {
        inserted += sqlx::query(
            "INSERT INTO products (id, name, brand, description, category_id) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(&product.category_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    tracing::info!(
        available = products.len(),
        limit,
        staged = staged.len(),
        inserted,
        "staged products"
    );
    Ok(inserted)
}

/// Returns the ids currently present in `products`: the staged set at load
/// time, not only the prefix this run passed to [`stage_products`].
///
/// Products staged by an earlier run with a larger limit stay in the table,
/// so their variants still pass the filter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn staged_product_ids(conn: &mut PgConnection) -> Result<HashSet<String>, DbError> {
    let ids = sqlx::query_scalar::<_, String>("SELECT id FROM products")
        .fetch_all(&mut *conn)
        .await?;
    Ok(ids.into_iter().collect())
}
