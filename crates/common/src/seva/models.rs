//! Seva board models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Kind of volunteer service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SevaCategory {
    Langar,
    #[default]
    Service,
    Education,
    Other,
}

impl SevaCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SevaCategory::Langar => "Langar",
            SevaCategory::Service => "Service",
            SevaCategory::Education => "Education",
            SevaCategory::Other => "Other",
        }
    }
}

impl fmt::Display for SevaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SevaCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Langar" => Ok(SevaCategory::Langar),
            "Service" => Ok(SevaCategory::Service),
            "Education" => Ok(SevaCategory::Education),
            "Other" => Ok(SevaCategory::Other),
            other => Err(format!("unknown seva category '{}'", other)),
        }
    }
}

/// A volunteer event with its set of joined volunteers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SevaEvent {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub date: NaiveDate,
    pub category: SevaCategory,
    pub capacity: u32,
    pub description: Option<String>,
    pub volunteer_ids: BTreeSet<String>,
    /// Bumped on every successful join
    pub version: u64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl SevaEvent {
    pub fn volunteer_count(&self) -> usize {
        self.volunteer_ids.len()
    }

    pub fn is_full(&self) -> bool {
        self.volunteer_count() >= self.capacity as usize
    }

    pub fn has_volunteer(&self, user_id: &str) -> bool {
        self.volunteer_ids.contains(user_id)
    }

    pub fn view(&self) -> SevaEventView {
        let count = self.volunteer_count();
        SevaEventView {
            id: self.id,
            title: self.title.clone(),
            location: self.location.clone(),
            date: self.date,
            category: self.category,
            capacity: self.capacity,
            description: self.description.clone(),
            volunteer_count: count,
            spots_left: (self.capacity as usize).saturating_sub(count),
            is_full: self.is_full(),
            created_at: self.created_at,
        }
    }
}

/// Public shape of an event; volunteer ids stay private
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SevaEventView {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub date: NaiveDate,
    pub category: SevaCategory,
    pub capacity: u32,
    pub description: Option<String>,
    pub volunteer_count: usize,
    pub spots_left: usize,
    pub is_full: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/seva/events`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSevaEventRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 200, message = "location must be 1-200 characters"))]
    pub location: String,

    /// `YYYY-MM-DD`
    pub date: String,

    #[serde(default)]
    pub category: SevaCategory,

    #[validate(range(min = 1, max = 10000, message = "capacity must be between 1 and 10000"))]
    pub capacity: u32,

    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,
}

impl CreateSevaEventRequest {
    /// Trim text fields; a blank description becomes `None`
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            location: self.location.trim().to_string(),
            date: self.date.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            ..self
        }
    }
}

/// Response of `POST /api/seva/events/{id}/join`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    /// False when the user was already signed up
    pub joined: bool,
    pub event: SevaEventView,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(capacity: u32, volunteers: &[&str]) -> SevaEvent {
        SevaEvent {
            id: Uuid::new_v4(),
            title: "Langar prep".into(),
            location: "Gurdwara hall".into(),
            date: NaiveDate::from_ymd_opt(2026, 11, 15).unwrap(),
            category: SevaCategory::Langar,
            capacity,
            description: None,
            volunteer_ids: volunteers.iter().map(|v| v.to_string()).collect(),
            version: 0,
            created_by: "organizer".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_counts() {
        let view = event(3, &["a", "b"]).view();
        assert_eq!(view.volunteer_count, 2);
        assert_eq!(view.spots_left, 1);
        assert!(!view.is_full);

        let full = event(2, &["a", "b"]).view();
        assert!(full.is_full);
        assert_eq!(full.spots_left, 0);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Education".parse::<SevaCategory>().unwrap(), SevaCategory::Education);
        assert!("langar".parse::<SevaCategory>().is_err());
        assert_eq!(SevaCategory::default(), SevaCategory::Service);
    }

    #[test]
    fn test_request_validation() {
        let request: CreateSevaEventRequest = serde_json::from_value(serde_json::json!({
            "title": "  ",
            "location": "Hall",
            "date": "2026-11-15",
            "capacity": 0,
            "description": "   "
        }))
        .unwrap();

        let request = request.normalized();
        assert!(request.description.is_none());

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("capacity"));
        assert!(!fields.contains_key("location"));
    }
}
