use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::app::router::AppState;
use crate::handlers::error::{HandlerError, HandlerResult};
use crate::models::payment::PaymentLookup;

/// Return URL and webhook target. The body is ignored; the call only
/// triggers a status check against SumUp.
pub async fn checkout_event(
    State(state): State<AppState>,
    Path((event, payment_id)): Path<(String, u64)>,
) -> HandlerResult<StatusCode> {
    let lookup = PaymentLookup::in_event(event, payment_id);
    let mut payment = state
        .provider
        .store()
        .find(&lookup)
        .await?
        .ok_or(HandlerError::NotFound)?;

    info!("Checkout event received for payment {}", payment.id);
    state.provider.synchronize_payment_status(&mut payment).await?;

    Ok(StatusCode::NO_CONTENT)
}
