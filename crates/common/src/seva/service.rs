use super::models::{CreateSevaEventRequest, SevaEvent};
use super::store::{SevaStore, VolunteerAdd};
use crate::auth::UserContext;
use crate::errors::{AppError, Result};
use crate::metrics;
use chrono::{NaiveDate, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Result of a join request
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    /// The user was added
    Joined(SevaEvent),
    /// The user was already signed up; nothing changed
    AlreadyJoined(SevaEvent),
}

impl JoinOutcome {
    pub fn joined(&self) -> bool {
        matches!(self, JoinOutcome::Joined(_))
    }

    pub fn event(&self) -> &SevaEvent {
        match self {
            JoinOutcome::Joined(event) | JoinOutcome::AlreadyJoined(event) => event,
        }
    }
}

/// Seva board operations over a [`SevaStore`]
pub struct SevaService {
    store: Arc<dyn SevaStore>,
}

impl SevaService {
    pub fn new(store: Arc<dyn SevaStore>) -> Self {
        Self { store }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Validate and store a new event created by `user`
    pub async fn create(
        &self,
        request: CreateSevaEventRequest,
        user: &UserContext,
    ) -> Result<SevaEvent> {
        let request = request.normalized();
        request.validate()?;

        let date = NaiveDate::parse_from_str(&request.date, "%Y-%m-%d")
            .map_err(|_| AppError::validation("date", "date must be formatted YYYY-MM-DD"))?;

        let event = SevaEvent {
            id: Uuid::new_v4(),
            title: request.title,
            location: request.location,
            date,
            category: request.category,
            capacity: request.capacity,
            description: request.description,
            volunteer_ids: BTreeSet::new(),
            version: 0,
            created_by: user.user_id.clone(),
            created_at: Utc::now(),
        };

        let event = self.store.insert(event).await?;
        tracing::info!(event_id = %event.id, capacity = event.capacity, "Seva event created");
        Ok(event)
    }

    pub async fn list(&self) -> Result<Vec<SevaEvent>> {
        self.store.list().await
    }

    /// Add `user_id` to the event without ever exceeding its capacity.
    ///
    /// The store checks membership and capacity and adds the volunteer in a
    /// single atomic step; a join only conflicts when the event is full.
    pub async fn join(&self, id: Uuid, user_id: &str) -> Result<JoinOutcome> {
        let added = self
            .store
            .add_volunteer_if_room(id, user_id)
            .await?
            .ok_or_else(|| AppError::SevaEventNotFound { id: id.to_string() })?;

        match added {
            VolunteerAdd::Added(event) => {
                metrics::record_seva_join("joined");
                tracing::info!(
                    event_id = %id,
                    volunteers = event.volunteer_count(),
                    capacity = event.capacity,
                    "Volunteer joined seva event"
                );
                Ok(JoinOutcome::Joined(event))
            }
            VolunteerAdd::AlreadyJoined(event) => {
                metrics::record_seva_join("already_joined");
                Ok(JoinOutcome::AlreadyJoined(event))
            }
            VolunteerAdd::Full(_) => {
                metrics::record_seva_join("full");
                Err(AppError::Conflict {
                    message: "Seva event is full".to_string(),
                })
            }
        }
    }

    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }
}
