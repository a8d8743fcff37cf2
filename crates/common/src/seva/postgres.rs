//! PostgreSQL seva store

use super::models::{SevaCategory, SevaEvent};
use super::store::{SevaStore, VolunteerAdd};
use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const EVENT_COLUMNS: &str = "id, title, location, event_date, category, capacity, description, \
                             volunteer_ids, version, created_by, created_at";

#[derive(Debug, sqlx::FromRow)]
struct SevaEventRow {
    id: Uuid,
    title: String,
    location: String,
    event_date: NaiveDate,
    category: String,
    capacity: i32,
    description: Option<String>,
    volunteer_ids: Vec<String>,
    version: i64,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SevaEventRow> for SevaEvent {
    type Error = AppError;

    fn try_from(row: SevaEventRow) -> Result<Self> {
        let category = row
            .category
            .parse::<SevaCategory>()
            .map_err(|message| AppError::Internal { message })?;

        Ok(SevaEvent {
            id: row.id,
            title: row.title,
            location: row.location,
            date: row.event_date,
            category,
            capacity: u32::try_from(row.capacity).unwrap_or(0),
            description: row.description,
            volunteer_ids: row.volunteer_ids.into_iter().collect(),
            version: u64::try_from(row.version).unwrap_or(0),
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

/// Seva store backed by a PostgreSQL table
#[derive(Clone)]
pub struct PgSevaStore {
    pool: PgPool,
}

impl PgSevaStore {
    /// Connect and apply the embedded migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.url.as_deref().ok_or_else(|| AppError::Configuration {
            message: "database.url is not set".to_string(),
        })?;

        info!(max_connections = config.max_connections, "Connecting to seva database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Seva database ready");

        Ok(Self::new(pool))
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SevaStore for PgSevaStore {
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn insert(&self, event: SevaEvent) -> Result<SevaEvent> {
        let volunteers: Vec<String> = event.volunteer_ids.iter().cloned().collect();
        let row: SevaEventRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO seva_events
                (id, title, location, event_date, category, capacity, description,
                 volunteer_ids, version, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.location)
        .bind(event.date)
        .bind(event.category.as_str())
        .bind(i32::try_from(event.capacity).unwrap_or(i32::MAX))
        .bind(&event.description)
        .bind(&volunteers)
        .bind(i64::try_from(event.version).unwrap_or(i64::MAX))
        .bind(&event.created_by)
        .bind(event.created_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list(&self) -> Result<Vec<SevaEvent>> {
        let rows: Vec<SevaEventRow> = sqlx::query_as(&format!(
            "SELECT {} FROM seva_events ORDER BY event_date ASC, created_at ASC",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SevaEvent::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<SevaEvent>> {
        let row: Option<SevaEventRow> = sqlx::query_as(&format!(
            "SELECT {} FROM seva_events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SevaEvent::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn add_volunteer_if_room(&self, id: Uuid, user_id: &str) -> Result<Option<VolunteerAdd>> {
        let added: Option<SevaEventRow> = sqlx::query_as(&format!(
            r#"
            UPDATE seva_events
            SET volunteer_ids = array_append(volunteer_ids, $2),
                version = version + 1
            WHERE id = $1
              AND NOT ($2 = ANY(volunteer_ids))
              AND cardinality(volunteer_ids) < capacity
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = added {
            return Ok(Some(VolunteerAdd::Added(row.try_into()?)));
        }

        // Membership and fullness only ever grow, so the reason the update
        // matched nothing still holds when the row is read back.
        let Some(event) = self.get(id).await? else {
            return Ok(None);
        };
        debug!(event_id = %id, "Seva join made no change");
        if event.has_volunteer(user_id) {
            Ok(Some(VolunteerAdd::AlreadyJoined(event)))
        } else {
            Ok(Some(VolunteerAdd::Full(event)))
        }
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
