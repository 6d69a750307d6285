use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// A named attendee of a holiday plan.
///
/// Clients submit participants as bare name strings; rows store (and
/// responses return) this object shape. The extra level of structure leaves
/// room for per-participant fields later without a column migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A holiday plan row.
///
/// `participants` lives in a single JSONB column as an array of
/// [`Participant`] objects. `id` is server-assigned and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HolidayPlan {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub location: String,
    pub participants: Json<Vec<Participant>>,
}
