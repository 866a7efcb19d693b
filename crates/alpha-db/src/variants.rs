//! Row-isolated loading of derived product variants.
//!
//! Every variant is its own unit of work: one autocommitted `INSERT` on the
//! held connection. A row the database rejects is logged and recorded, and the
//! loop moves on; rows committed before it stay committed. Errors that mean
//! the connection itself is gone abort the loop.

use alpha_core::ProductVariant;
use sqlx::PgConnection;

use crate::DbError;

/// Destination for derived variants, one row per call.
#[allow(async_fn_in_trait)]
pub trait VariantSink {
    /// Persist a single variant. Must not leave a partial row behind on error.
    async fn insert_variant(&mut self, variant: &ProductVariant) -> Result<(), DbError>;
}

impl VariantSink for PgConnection {
    async fn insert_variant(&mut self, variant: &ProductVariant) -> Result<(), DbError> {
        insert_variant(self, variant).await
    }
}

/// Inserts one variant as a standalone statement.
///
/// `color_id` and `size_id` are bound as `NULL` when absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_variant(
    conn: &mut PgConnection,
    variant: &ProductVariant,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO product_variants \
             (id, product_id, color_id, image_name, size_id, price) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(variant.id)
    .bind(&variant.product_id)
    .bind(&variant.color_id)
    .bind(&variant.image_name)
    .bind(&variant.size_id)
    .bind(variant.price)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// A variant the database refused, with its position in the input.
#[derive(Debug, Clone)]
pub struct RowFailure {
    pub index: usize,
    pub variant: ProductVariant,
    pub error: String,
}

/// Outcome of [`load_variants_isolated`].
#[derive(Debug, Clone, Default)]
pub struct VariantLoadReport {
    pub attempted: usize,
    pub inserted: usize,
    pub failures: Vec<RowFailure>,
}

impl VariantLoadReport {
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.failures.len()
    }
}

/// Inserts `variants` one at a time through `sink`.
///
/// Row rejections (see [`DbError::is_row_rejection`]) are logged with the
/// offending row and collected into the report; the loop continues with the
/// next row. No transaction spans more than one row.
///
/// # Errors
///
/// Returns the first error that is not a row rejection, e.g. a lost
/// connection. Rows inserted before it remain committed.
pub async fn load_variants_isolated<S, I>(
    sink: &mut S,
    variants: I,
) -> Result<VariantLoadReport, DbError>
where
    S: VariantSink,
    I: IntoIterator<Item = ProductVariant>,
{
    let mut report = VariantLoadReport::default();

    for (index, variant) in variants.into_iter().enumerate() {
        report.attempted += 1;

        match sink.insert_variant(&variant).await {
            Ok(()) => report.inserted += 1,
            Err(err) if err.is_row_rejection() => {
                tracing::warn!(
                    row = index,
                    variant_id = %variant.id,
                    product_id = %variant.product_id,
                    color_id = ?variant.color_id,
                    size_id = ?variant.size_id,
                    image_name = %variant.image_name,
                    price = variant.price,
                    error = %err,
                    "skipping variant \u{2014} rejected by database"
                );
                report.failures.push(RowFailure {
                    index,
                    variant,
                    error: err.to_string(),
                });
            }
            Err(err) => {
                tracing::error!(
                    row = index,
                    inserted = report.inserted,
                    skipped = report.skipped(),
                    error = %err,
                    "aborting variant load"
                );
                return Err(err);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use uuid::Uuid;

    use super::*;

    /// In-memory sink that rejects or fails chosen call indexes.
    #[derive(Default)]
    struct ScriptedSink {
        calls: usize,
        reject_at: HashSet<usize>,
        fatal_at: Option<usize>,
        committed: Vec<ProductVariant>,
    }

    impl VariantSink for ScriptedSink {
        async fn insert_variant(&mut self, variant: &ProductVariant) -> Result<(), DbError> {
            let call = self.calls;
            self.calls += 1;

            if self.fatal_at == Some(call) {
                return Err(DbError::Sqlx(sqlx::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionAborted,
                    "connection lost",
                ))));
            }
            if self.reject_at.contains(&call) {
                return Err(DbError::Sqlx(sqlx::Error::Encode(
                    "engineered rejection".into(),
                )));
            }

            self.committed.push(variant.clone());
            Ok(())
        }
    }

    fn variant(n: u128) -> ProductVariant {
        ProductVariant {
            id: Uuid::from_u128(n),
            product_id: format!("p{n}"),
            color_id: None,
            image_name: format!("images/products/{n}.png"),
            size_id: None,
            price: 10,
        }
    }

    fn batch(count: u128) -> Vec<ProductVariant> {
        (1..=count).map(variant).collect()
    }

    #[tokio::test]
    async fn third_row_rejection_does_not_block_the_rest() {
        let mut sink = ScriptedSink {
            reject_at: HashSet::from([2]),
            ..ScriptedSink::default()
        };

        let report = load_variants_isolated(&mut sink, batch(5))
            .await
            .expect("row rejection must not escape the loop");

        assert_eq!(report.attempted, 5);
        assert_eq!(report.inserted, 4);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert_eq!(report.failures[0].variant.product_id, "p3");
        assert!(report.failures[0].error.contains("engineered rejection"));

        let committed: Vec<&str> = sink
            .committed
            .iter()
            .map(|v| v.product_id.as_str())
            .collect();
        assert_eq!(committed, vec!["p1", "p2", "p4", "p5"]);
    }

    #[tokio::test]
    async fn every_row_rejected_still_completes() {
        let mut sink = ScriptedSink {
            reject_at: (0..3).collect(),
            ..ScriptedSink::default()
        };

        let report = load_variants_isolated(&mut sink, batch(3)).await.unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.inserted, 0);
        assert_eq!(report.skipped(), 3);
    }

    #[tokio::test]
    async fn empty_input_makes_no_insert_attempts() {
        let mut sink = ScriptedSink::default();

        let report = load_variants_isolated(&mut sink, Vec::new()).await.unwrap();

        assert_eq!(sink.calls, 0);
        assert_eq!(report.attempted, 0);
        assert_eq!(report.inserted, 0);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn fatal_error_aborts_and_keeps_earlier_rows() {
        let mut sink = ScriptedSink {
            fatal_at: Some(3),
            ..ScriptedSink::default()
        };

        let err = load_variants_isolated(&mut sink, batch(6))
            .await
            .expect_err("connection loss must propagate");

        assert!(!err.is_row_rejection());
        assert_eq!(sink.calls, 4, "loop must stop at the fatal row");
        assert_eq!(sink.committed.len(), 3);
    }

    #[tokio::test]
    async fn absent_optionals_reach_the_sink_as_none() {
        let mut sink = ScriptedSink::default();
        let mut row = variant(1);
        row.color_id = None;
        row.size_id = Some("s1".to_owned());

        load_variants_isolated(&mut sink, vec![row]).await.unwrap();

        assert_eq!(sink.committed[0].color_id, None);
        assert_eq!(sink.committed[0].size_id.as_deref(), Some("s1"));
    }
}
