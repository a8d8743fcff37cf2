//! Seva board
//!
//! Volunteer events with a capacity and a set of joined users. A join is a
//! single conditional add in the store, so concurrent joins can never push
//! an event past its capacity.

mod models;
mod postgres;
mod service;
mod store;

pub use models::{CreateSevaEventRequest, JoinResponse, SevaCategory, SevaEvent, SevaEventView};
pub use postgres::PgSevaStore;
pub use service::{JoinOutcome, SevaService};
pub use store::{InMemorySevaStore, SevaStore, VolunteerAdd};
