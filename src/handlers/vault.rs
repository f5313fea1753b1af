use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::{WithRejection, cookie::PrivateCookieJar};
use tracing::info;

use crate::middleware::session::VaultSession;
use crate::service::vault_actor::UsageReport;
use crate::types::rendering::{DeskForm, UpdateForm, UploadForm, ValueBody};
use crate::{DeskError, router::DeskState};

type Reply<T> = Result<(PrivateCookieJar, T), DeskError>;

/// GET /vault and GET /vault/usage -> memory report since the previous one.
pub async fn report_usage(
    State(state): State<DeskState>,
    vault: VaultSession,
) -> Reply<Json<UsageReport>> {
    let report = state.vault.session(vault.id.as_str()).report_usage().await?;
    Ok((vault.save(), Json(report)))
}

/// POST /vault/records
pub async fn upload(
    State(state): State<DeskState>,
    vault: VaultSession,
    WithRejection(Form(form), _): DeskForm<UploadForm>,
) -> Reply<StatusCode> {
    state
        .vault
        .session(vault.id.as_str())
        .upload(form.key.clone(), form.value, form.confidential)
        .await?;
    info!(key = %form.key, confidential = form.confidential, "data uploaded");
    Ok((vault.save(), StatusCode::CREATED))
}

/// GET /vault/records/{key}
pub async fn read(
    State(state): State<DeskState>,
    vault: VaultSession,
    Path(key): Path<String>,
) -> Reply<Json<ValueBody>> {
    let value = state.vault.session(vault.id.as_str()).read(key.clone()).await?;
    Ok((vault.save(), Json(ValueBody { key, value })))
}

/// PUT /vault/records/{key}
pub async fn update(
    State(state): State<DeskState>,
    vault: VaultSession,
    Path(key): Path<String>,
    WithRejection(Form(form), _): DeskForm<UpdateForm>,
) -> Reply<StatusCode> {
    state
        .vault
        .session(vault.id.as_str())
        .update(key.clone(), form.value, form.confidential)
        .await?;
    info!(key = %key, confidential = form.confidential, "data updated");
    Ok((vault.save(), StatusCode::NO_CONTENT))
}

/// DELETE /vault/records/{key}
pub async fn delete(
    State(state): State<DeskState>,
    vault: VaultSession,
    Path(key): Path<String>,
) -> Reply<StatusCode> {
    state.vault.session(vault.id.as_str()).delete(key.clone()).await?;
    info!(key = %key, "data deleted");
    Ok((vault.save(), StatusCode::NO_CONTENT))
}
