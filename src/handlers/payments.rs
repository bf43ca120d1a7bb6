use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::app::router::AppState;
use crate::handlers::error::{HandlerError, HandlerResult};
use crate::models::checkout::BuyerDetails;
use crate::models::payment::{OrderPayment, PaymentLookup, PaymentState};

// Payload enviado pela loja ao iniciar um pagamento
#[derive(Debug, Deserialize)]
pub struct RegisterPayment {
    pub id: u64,
    pub order_code: String,
    pub order_secret: String,
    #[serde(default)]
    pub order_email: String,
    pub amount: BigDecimal,
    pub currency: String,
    #[serde(default)]
    pub buyer: BuyerDetails,
}

#[derive(Debug, Serialize)]
pub struct RegisteredPayment {
    pub payment: u64,
    pub checkout_id: String,
    pub widget_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefundRequest {
    #[serde(default)]
    pub amount: Option<BigDecimal>,
}

async fn load(state: &AppState, event: String, payment_id: u64) -> HandlerResult<OrderPayment> {
    state
        .provider
        .store()
        .find(&PaymentLookup::in_event(event, payment_id))
        .await?
        .ok_or(HandlerError::NotFound)
}

/// Registers a payment of the shop and opens its SumUp checkout.
pub async fn register_payment(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Json(payload): Json<RegisterPayment>,
) -> HandlerResult<(StatusCode, Json<RegisteredPayment>)> {
    let lookup = PaymentLookup::in_event(event.clone(), payload.id);
    if state.provider.store().find(&lookup).await?.is_some() {
        return Err(HandlerError::Validation("Payment is already registered.".into()));
    }
    if payload.amount <= BigDecimal::from(0) {
        return Err(HandlerError::Validation("Amount must be positive.".into()));
    }

    let mut payment = OrderPayment {
        id: payload.id,
        event,
        order_code: payload.order_code,
        order_secret: payload.order_secret,
        order_email: payload.order_email,
        amount: payload.amount,
        currency: payload.currency,
        state: PaymentState::Created,
        info: Map::new(),
    };
    // Only stored once the checkout exists on SumUp
    let checkout_id = state
        .provider
        .create_checkout_for(&mut payment, payload.buyer)
        .await?;
    info!("Registered payment {} of order {}", payment.id, payment.order_code);

    Ok((
        StatusCode::CREATED,
        Json(RegisteredPayment {
            payment: payment.id,
            checkout_id,
            widget_url: state.provider.widget_url(&payment),
        }),
    ))
}

pub async fn cancel_payment(
    State(state): State<AppState>,
    Path((event, payment_id)): Path<(String, u64)>,
) -> HandlerResult<StatusCode> {
    let mut payment = load(&state, event, payment_id).await?;
    state.provider.cancel_payment(&mut payment).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refund_payment(
    State(state): State<AppState>,
    Path((event, payment_id)): Path<(String, u64)>,
    Json(request): Json<RefundRequest>,
) -> HandlerResult<StatusCode> {
    let mut payment = load(&state, event, payment_id).await?;
    state
        .provider
        .refund_payment(&mut payment, request.amount.as_ref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn payment_methods(
    State(state): State<AppState>,
    Path((event, payment_id)): Path<(String, u64)>,
) -> HandlerResult<Json<Value>> {
    let payment = load(&state, event, payment_id).await?;
    Ok(Json(state.provider.payment_methods(&payment).await?))
}

pub async fn transaction(
    State(state): State<AppState>,
    Path((event, payment_id)): Path<(String, u64)>,
) -> HandlerResult<Json<Value>> {
    let payment = load(&state, event, payment_id).await?;
    Ok(Json(state.provider.transaction(&payment).await?))
}
