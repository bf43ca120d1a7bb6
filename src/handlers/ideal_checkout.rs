use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::app::router::AppState;
use crate::handlers::error::{HandlerError, HandlerResult};
use crate::models::payment::PaymentLookup;

#[derive(Debug, Serialize)]
pub struct IdealRedirect {
    pub redirect_url: String,
}

pub async fn ideal_checkout(
    State(state): State<AppState>,
    Path((event, payment_id)): Path<(String, u64)>,
) -> HandlerResult<Json<IdealRedirect>> {
    let lookup = PaymentLookup::in_event(event, payment_id);
    let payment = state
        .provider
        .store()
        .find(&lookup)
        .await?
        .ok_or(HandlerError::NotFound)?;

    let redirect_url = state.provider.execute_ideal_payment(&payment).await?;
    info!("Redirecting payment {} to iDEAL", payment.id);

    Ok(Json(IdealRedirect { redirect_url }))
}
