use axum::{
    extract::{Path, State},
    http::{header::CONTENT_SECURITY_POLICY, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tracing::debug;

use crate::app::router::AppState;
use crate::handlers::error::{HandlerError, HandlerResult};
use crate::models::payment::{OrderPayment, PaymentLookup, PaymentState};
use crate::utils::csp::{generate_nonce, render_policy, widget_policy};
use crate::utils::locale::{language_from_headers, sumup_locale};
use crate::utils::money::format_amount;

pub const WIDGET_TEMPLATE: &str = "payment_widget.html";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WidgetContext {
    Checkout {
        checkout_id: String,
        payment: u64,
        email: String,
        retry: bool,
        locale: &'static str,
        amount: String,
        currency: String,
        csp_nonce: String,
    },
    Reload {
        reload: bool,
        csp_nonce: String,
    },
}

/// Chooses what the widget page shows for the payment's state. `None` means
/// there is nothing to show.
pub fn widget_context(
    payment: &OrderPayment,
    checkout_id: &str,
    locale: &'static str,
    csp_nonce: String,
) -> Option<WidgetContext> {
    match payment.state {
        PaymentState::Pending | PaymentState::Failed => Some(WidgetContext::Checkout {
            checkout_id: checkout_id.to_string(),
            payment: payment.id,
            email: payment.order_email.clone(),
            retry: payment.state == PaymentState::Failed,
            locale,
            amount: format_amount(&payment.amount),
            currency: payment.currency.clone(),
            csp_nonce,
        }),
        // Paid in the meantime, the parent page reloads to show the result
        PaymentState::Confirmed => Some(WidgetContext::Reload {
            reload: true,
            csp_nonce,
        }),
        _ => None,
    }
}

pub async fn payment_widget(
    State(state): State<AppState>,
    Path((event, order, secret, payment_id)): Path<(String, String, String, u64)>,
    headers: HeaderMap,
) -> HandlerResult<Response> {
    let lookup = PaymentLookup::in_event(event, payment_id).with_order(order, secret);
    let mut payment = state
        .provider
        .store()
        .find(&lookup)
        .await?
        .ok_or(HandlerError::NotFound)?;

    // Backup in case the return call never reached us
    state.provider.synchronize_payment_status(&mut payment).await?;

    let checkout_id = payment
        .checkout_id()
        .ok_or_else(|| HandlerError::Validation("No SumUp checkout ID found.".into()))?
        .to_string();

    let csp_nonce = generate_nonce();
    let csp_header = render_policy(&widget_policy(&csp_nonce));
    let locale = sumup_locale(&language_from_headers(&headers));

    let Some(context) = widget_context(&payment, &checkout_id, locale, csp_nonce) else {
        debug!("Payment {} is {:?}, no widget", payment.id, payment.state);
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let html = state
        .templates
        .render(WIDGET_TEMPLATE, &tera::Context::from_serialize(&context)?)?;
    let csp_value = HeaderValue::from_str(&csp_header)
        .map_err(|e| HandlerError::Internal(format!("invalid CSP header: {e}")))?;

    Ok(([(CONTENT_SECURITY_POLICY, csp_value)], Html(html)).into_response())
}
