//! Sequence maintenance handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{AppError, AppResult};
use crate::services::sequence::{SequenceKind, SequenceReset};
use crate::services::SequenceService;
use crate::AppState;

/// Realign a sequence with the highest code already in use
pub async fn reset_sequence(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<SequenceReset>> {
    let kind = SequenceKind::from_name(&name)
        .ok_or_else(|| AppError::NotFound(format!("Sequence {}", name)))?;

    let service = SequenceService::new(state.db);
    let reset = service.reset(kind).await?;
    Ok(Json(reset))
}
