//! Plan service layer.
//!
//! Orchestrates validation, the participants transform and persistence for
//! each operation. Every mutating operation (create, update, delete) runs
//! inside a single database transaction: committed on full success, rolled
//! back on any failure.

use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::PgPool;

use vplan_db::models::HolidayPlan;
use vplan_db::queries::holiday_plans;

use super::participants_to_stored;
use super::rules::{self, ValidationErrors};
use crate::pdf::{self, PdfRenderer};

/// Outcome taxonomy for plan operations. Callers must be able to tell
/// not-found and validation failures apart from everything else.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The requested id has no corresponding stored record.
    #[error("record not found")]
    NotFound,

    /// The request body broke one or more validation rules.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// Persistence or rendering failure, with the underlying cause.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Fetch every stored plan, in creation order. No filtering, no pagination.
pub async fn list(pool: &PgPool) -> Result<Vec<HolidayPlan>, PlanError> {
    Ok(holiday_plans::list_plans(pool).await?)
}

/// Fetch one plan by id.
pub async fn get(pool: &PgPool, id: i64) -> Result<HolidayPlan, PlanError> {
    holiday_plans::get_plan(pool, id)
        .await?
        .ok_or(PlanError::NotFound)
}

/// Validate, transform and persist a new plan.
pub async fn create(pool: &PgPool, body: &Value) -> Result<HolidayPlan, PlanError> {
    let fields = rules::validate(body).map_err(PlanError::Validation)?;

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let stored = participants_to_stored(&fields.participants);
    let plan = holiday_plans::insert_plan(
        &mut tx,
        &fields.title,
        fields.description.as_deref(),
        fields.date,
        &fields.location,
        &stored,
    )
    .await?;

    tx.commit().await.context("failed to commit transaction")?;

    tracing::info!(id = plan.id, "holiday plan created");
    Ok(plan)
}

/// Replace every mutable field of an existing plan.
///
/// The record is located first: an unknown id is a [`PlanError::NotFound`]
/// before the body is validated. Omitted fields fail validation exactly as
/// they would on create (full replace, no merge).
pub async fn update(pool: &PgPool, id: i64, body: &Value) -> Result<HolidayPlan, PlanError> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    if !holiday_plans::plan_exists(&mut tx, id).await? {
        // Transaction rolls back on drop (no commit).
        return Err(PlanError::NotFound);
    }

    let fields = rules::validate(body).map_err(PlanError::Validation)?;

    let stored = participants_to_stored(&fields.participants);
    let plan = holiday_plans::update_plan(
        &mut tx,
        id,
        &fields.title,
        fields.description.as_deref(),
        fields.date,
        &fields.location,
        &stored,
    )
    .await?
    .ok_or(PlanError::NotFound)?;

    tx.commit().await.context("failed to commit transaction")?;

    tracing::info!(id, "holiday plan updated");
    Ok(plan)
}

/// Remove a plan by id.
pub async fn delete(pool: &PgPool, id: i64) -> Result<(), PlanError> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    if !holiday_plans::delete_plan(&mut tx, id).await? {
        return Err(PlanError::NotFound);
    }

    tx.commit().await.context("failed to commit transaction")?;

    tracing::info!(id, "holiday plan removed");
    Ok(())
}

/// Render one plan as a PDF document.
///
/// The renderer is never invoked for an unknown id.
pub async fn export_pdf(
    pool: &PgPool,
    id: i64,
    renderer: &dyn PdfRenderer,
) -> Result<Vec<u8>, PlanError> {
    let plan = get(pool, id).await?;

    let html = pdf::render_plan_html(&plan);
    let bytes = renderer
        .render(&html)
        .await
        .with_context(|| format!("{} failed to render plan {id}", renderer.name()))?;

    Ok(bytes)
}
