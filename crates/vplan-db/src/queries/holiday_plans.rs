//! Database query functions for the `holiday_plans` table.
//!
//! Reads take a pool; writes take a connection so the service layer can run
//! them inside a transaction.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::{HolidayPlan, Participant};

/// List all plans, ordered by id (creation order).
pub async fn list_plans(pool: &PgPool) -> Result<Vec<HolidayPlan>> {
    let plans = sqlx::query_as::<_, HolidayPlan>("SELECT * FROM holiday_plans ORDER BY id")
        .fetch_all(pool)
        .await
        .context("failed to list holiday plans")?;

    Ok(plans)
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: i64) -> Result<Option<HolidayPlan>> {
    let plan = sqlx::query_as::<_, HolidayPlan>("SELECT * FROM holiday_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch holiday plan")?;

    Ok(plan)
}

/// Check whether a plan row exists.
pub async fn plan_exists(conn: &mut PgConnection, id: i64) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM holiday_plans WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await
            .context("failed to check holiday plan existence")?;

    Ok(exists)
}

/// Insert a new plan row. Returns the inserted plan with its
/// server-generated id.
pub async fn insert_plan(
    conn: &mut PgConnection,
    title: &str,
    description: Option<&str>,
    date: NaiveDate,
    location: &str,
    participants: &[Participant],
) -> Result<HolidayPlan> {
    let plan = sqlx::query_as::<_, HolidayPlan>(
        "INSERT INTO holiday_plans (title, description, date, location, participants) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(title)
    .bind(description)
    .bind(date)
    .bind(location)
    .bind(Json(participants))
    .fetch_one(conn)
    .await
    .context("failed to insert holiday plan")?;

    Ok(plan)
}

/// Replace every mutable field of a plan. Returns `None` when no row with
/// that id exists.
pub async fn update_plan(
    conn: &mut PgConnection,
    id: i64,
    title: &str,
    description: Option<&str>,
    date: NaiveDate,
    location: &str,
    participants: &[Participant],
) -> Result<Option<HolidayPlan>> {
    let plan = sqlx::query_as::<_, HolidayPlan>(
        "UPDATE holiday_plans \
         SET title = $2, description = $3, date = $4, location = $5, participants = $6 \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(date)
    .bind(location)
    .bind(Json(participants))
    .fetch_optional(conn)
    .await
    .context("failed to update holiday plan")?;

    Ok(plan)
}

/// Delete a plan row. Returns `false` when no row with that id exists.
pub async fn delete_plan(conn: &mut PgConnection, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM holiday_plans WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await
        .context("failed to delete holiday plan")?;

    Ok(result.rows_affected() > 0)
}
