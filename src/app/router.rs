use axum::{
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tera::Tera;

use crate::handlers::{checkout_event, ideal_checkout, payment_widget, payments};
use crate::services::provider::SumUpProvider;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<SumUpProvider>,
    pub templates: Arc<Tera>,
}

impl AppState {
    pub fn new(provider: Arc<SumUpProvider>) -> Result<Self, tera::Error> {
        Ok(Self {
            provider,
            templates: Arc::new(load_templates()?),
        })
    }
}

pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.register_filter("js_string", js_string);
    tera.add_raw_template(
        payment_widget::WIDGET_TEMPLATE,
        include_str!("../../templates/payment_widget.html"),
    )?;
    Ok(tera)
}

/// JSON literal safe to place inside an inline `<script>`.
pub fn js_string(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let literal = serde_json::to_string(&text)
        .map_err(|e| tera::Error::msg(format!("js_string: {e}")))?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026");
    Ok(Value::String(literal))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/:event/sumup/return/:payment/",
            post(checkout_event::checkout_event),
        )
        .route(
            "/:event/sumup/widget/:order/:secret/:payment/",
            get(payment_widget::payment_widget),
        )
        .route(
            "/:event/sumup/ideal/:payment/",
            get(ideal_checkout::ideal_checkout).post(ideal_checkout::ideal_checkout),
        )
        .route("/:event/sumup/payments/", post(payments::register_payment))
        .route(
            "/:event/sumup/payments/:payment/cancel/",
            post(payments::cancel_payment),
        )
        .route(
            "/:event/sumup/payments/:payment/refund/",
            post(payments::refund_payment),
        )
        .route(
            "/:event/sumup/payments/:payment/methods/",
            get(payments::payment_methods),
        )
        .route(
            "/:event/sumup/payments/:payment/transaction/",
            get(payments::transaction),
        )
        .with_state(state)
}

async fn health_handler() -> axum::http::StatusCode {
    axum::http::StatusCode::OK
}
