//! Seva event storage contract and the in-process store

use super::models::SevaEvent;
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Answer of [`SevaStore::add_volunteer_if_room`], with the event as stored
/// afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolunteerAdd {
    Added(SevaEvent),
    AlreadyJoined(SevaEvent),
    Full(SevaEvent),
}

/// Storage for seva events.
///
/// Joins go through [`SevaStore::add_volunteer_if_room`], which checks
/// membership and capacity and adds the volunteer as one atomic step.
#[async_trait]
pub trait SevaStore: Send + Sync {
    async fn insert(&self, event: SevaEvent) -> Result<SevaEvent>;

    /// All events ordered by date, then creation time
    async fn list(&self) -> Result<Vec<SevaEvent>>;

    async fn get(&self, id: Uuid) -> Result<Option<SevaEvent>>;

    /// Add `user_id` unless it is already a volunteer or the event is full.
    /// Returns `None` for an unknown event.
    async fn add_volunteer_if_room(&self, id: Uuid, user_id: &str) -> Result<Option<VolunteerAdd>>;

    /// Cheap liveness probe
    async fn ping(&self) -> Result<()>;

    /// Store kind for logs and readiness output
    fn backend_name(&self) -> &'static str;
}

/// Process-local store, used when no database is configured
#[derive(Default)]
pub struct InMemorySevaStore {
    events: RwLock<HashMap<Uuid, SevaEvent>>,
}

impl InMemorySevaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SevaStore for InMemorySevaStore {
    async fn insert(&self, event: SevaEvent) -> Result<SevaEvent> {
        self.events.write().await.insert(event.id, event.clone());
        Ok(event)
    }

    async fn list(&self) -> Result<Vec<SevaEvent>> {
        let mut events: Vec<SevaEvent> = self.events.read().await.values().cloned().collect();
        events.sort_by(|a, b| (a.date, a.created_at).cmp(&(b.date, b.created_at)));
        Ok(events)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SevaEvent>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn add_volunteer_if_room(&self, id: Uuid, user_id: &str) -> Result<Option<VolunteerAdd>> {
        let mut events = self.events.write().await;
        let Some(event) = events.get_mut(&id) else {
            return Ok(None);
        };

        let outcome = if event.has_volunteer(user_id) {
            VolunteerAdd::AlreadyJoined(event.clone())
        } else if event.is_full() {
            VolunteerAdd::Full(event.clone())
        } else {
            event.volunteer_ids.insert(user_id.to_string());
            event.version += 1;
            VolunteerAdd::Added(event.clone())
        };
        Ok(Some(outcome))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seva::models::SevaCategory;
    use chrono::{Duration, NaiveDate, Utc};

    fn event(day: u32, offset_secs: i64) -> SevaEvent {
        SevaEvent {
            id: Uuid::new_v4(),
            title: format!("Event {}", day),
            location: "Hall".into(),
            date: NaiveDate::from_ymd_opt(2026, 11, day).unwrap(),
            category: SevaCategory::Service,
            capacity: 2,
            description: None,
            volunteer_ids: Default::default(),
            version: 0,
            created_by: "organizer".into(),
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn test_list_orders_by_date_then_creation() {
        let store = InMemorySevaStore::new();
        let late = store.insert(event(20, 0)).await.unwrap();
        let early_second = store.insert(event(5, 10)).await.unwrap();
        let early_first = store.insert(event(5, 0)).await.unwrap();

        let ids: Vec<Uuid> = store.list().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![early_first.id, early_second.id, late.id]);
    }

    #[tokio::test]
    async fn test_add_volunteer_if_room() {
        let store = InMemorySevaStore::new();
        let created = store.insert(event(1, 0)).await.unwrap();

        let Some(VolunteerAdd::Added(updated)) =
            store.add_volunteer_if_room(created.id, "u1").await.unwrap()
        else {
            panic!("first volunteer should be added");
        };
        assert_eq!(updated.version, 1);
        assert!(updated.has_volunteer("u1"));

        let again = store.add_volunteer_if_room(created.id, "u1").await.unwrap();
        assert!(matches!(again, Some(VolunteerAdd::AlreadyJoined(ref e)) if e.version == 1));

        store.add_volunteer_if_room(created.id, "u2").await.unwrap();
        let full = store.add_volunteer_if_room(created.id, "u3").await.unwrap();
        assert!(matches!(full, Some(VolunteerAdd::Full(ref e)) if e.volunteer_count() == 2));

        let missing = store.add_volunteer_if_room(Uuid::new_v4(), "u1").await.unwrap();
        assert!(missing.is_none());
    }
}
