use async_trait::async_trait;
use huntbook_core::{Guide, GuideDirectory, StoreError};
use sqlx::PgPool;
use tracing::info;

use crate::map_sqlx_error;

#[derive(sqlx::FromRow)]
pub(crate) struct GuideRow {
    id: i64,
    name: String,
    experience_years: i32,
    is_active: bool,
}

impl From<GuideRow> for Guide {
    fn from(row: GuideRow) -> Self {
        Guide {
            id: row.id,
            name: row.name,
            experience_years: row.experience_years,
            is_active: row.is_active,
        }
    }
}

/// Read-only guide lookups against the pool.
#[derive(Clone)]
pub struct PgGuideDirectory {
    pool: PgPool,
}

impl PgGuideDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_guide(
        &self,
        name: &str,
        experience_years: i32,
        is_active: bool,
    ) -> Result<Guide, StoreError> {
        let row = sqlx::query_as::<_, GuideRow>(
            r#"
            INSERT INTO guides (name, experience_years, is_active)
            VALUES ($1, $2, $3)
            RETURNING id, name, experience_years, is_active
            "#,
        )
        .bind(name)
        .bind(experience_years)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    /// Deleting a guide cascades to its bookings.
    pub async fn delete_guide(&self, guide_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM guides WHERE id = $1")
            .bind(guide_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert the demo guides if the directory is empty. Returns how many were added.
    pub async fn seed_demo_guides(&self) -> Result<usize, StoreError> {
        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM guides")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if existing > 0 {
            info!("Guides already present ({}), skipping seed", existing);
            return Ok(0);
        }

        let demo = [
            ("John Smith", 15, true),
            ("Maria Garcia", 10, true),
            ("Robert Johnson", 5, true),
            ("Anna Williams", 3, true),
            ("Retired Guide", 20, false),
        ];
        for (name, experience_years, is_active) in demo {
            self.create_guide(name, experience_years, is_active).await?;
        }

        info!("Seeded {} demo guides", demo.len());
        Ok(demo.len())
    }
}

#[async_trait]
impl GuideDirectory for PgGuideDirectory {
    async fn find(&self, guide_id: i64) -> Result<Option<Guide>, StoreError> {
        let row = sqlx::query_as::<_, GuideRow>(
            "SELECT id, name, experience_years, is_active FROM guides WHERE id = $1",
        )
        .bind(guide_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Guide::from))
    }

    async fn list_active(&self, min_experience: Option<i32>) -> Result<Vec<Guide>, StoreError> {
        let rows = sqlx::query_as::<_, GuideRow>(
            r#"
            SELECT id, name, experience_years, is_active
            FROM guides
            WHERE is_active = TRUE
              AND ($1::INTEGER IS NULL OR experience_years >= $1)
            ORDER BY experience_years DESC, id ASC
            "#,
        )
        .bind(min_experience)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Guide::from).collect())
    }
}
