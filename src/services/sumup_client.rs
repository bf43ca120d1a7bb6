use crate::models::checkout::{CheckoutRequest, NewCheckout};
use crate::utils::money::{partial_refund_amount, to_wire_amount};
use bigdecimal::BigDecimal;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const SUMUP_BASE_URL: &str = "https://api.sumup.com/v0.1";

/// Rejection reported by SumUp in a 4xx response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumUpApiError {
    pub message: String,
    pub error_code: Option<String>,
    pub param: Option<String>,
}

impl fmt::Display for SumUpApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.error_code.as_deref().unwrap_or("None"),
            self.message
        )?;
        if let Some(param) = self.param.as_deref().filter(|p| !p.is_empty()) {
            write!(f, " ({param})")?;
        }
        Ok(())
    }
}

impl SumUpApiError {
    /// Builds the error from a parsed 4xx body. Validation failures come
    /// back as an array, in which case the first entry is used.
    pub fn from_body(body: &Value) -> Self {
        let body = match body {
            Value::Array(items) => items.first().unwrap_or(&Value::Null),
            other => other,
        };
        // Strings are kept verbatim, other JSON values by their text
        let field = |name: &str| match body.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        let message = |name: &str| field(name).filter(|s| !s.is_empty());

        Self {
            message: message("message")
                .or_else(|| message("error_message"))
                .unwrap_or_default(),
            error_code: field("error_code"),
            param: field("param"),
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("No API Key given.")]
    MissingCredential,
    #[error("The API Key is invalid.")]
    InvalidCredential,
    #[error("{0}")]
    Api(SumUpApiError),
    #[error("SumUp request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected SumUp response: {0}")]
    Structural(String),
    #[error("amount cannot be represented: {0}")]
    InvalidAmount(BigDecimal),
}

impl GatewayError {
    /// Credential problems are shown to the end user as validation errors.
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Self::MissingCredential | Self::InvalidCredential)
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Stateless wrapper around the SumUp REST API. One HTTP call per method,
/// no retries.
#[derive(Debug, Clone)]
pub struct SumUpClient {
    client: Client,
    base_url: String,
}

impl SumUpClient {
    pub fn new(base_url: &str, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder, access_token: &str) -> GatewayResult<RequestBuilder> {
        if access_token.is_empty() {
            return Err(GatewayError::MissingCredential);
        }
        Ok(request.bearer_auth(access_token))
    }

    pub async fn validate_access_token_and_get_merchant_code(
        &self,
        access_token: &str,
    ) -> GatewayResult<String> {
        let request = self.authorized(self.client.get(self.url("/me")), access_token)?;
        let response = request.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("SumUp rejected the configured access token");
            return Err(GatewayError::InvalidCredential);
        }

        let body = json_body(check_status(response).await?).await?;
        let merchant_code = body
            .pointer("/merchant_profile/merchant_code")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Structural("merchant_profile.merchant_code".into()))?;

        info!("Resolved SumUp merchant code {}", merchant_code);
        Ok(merchant_code.to_string())
    }

    pub async fn create_checkout(
        &self,
        checkout: &NewCheckout,
        access_token: &str,
    ) -> GatewayResult<String> {
        info!("Creating SumUp checkout {}", checkout.checkout_reference);

        let amount = to_wire_amount(&checkout.amount)
            .ok_or_else(|| GatewayError::InvalidAmount(checkout.amount.clone()))?;
        let payload = CheckoutRequest::new(checkout, amount);

        let request = self.authorized(self.client.post(self.url("/checkouts")), access_token)?;
        let response = request.json(&payload).send().await?;

        let body = json_body(check_status(response).await?).await?;
        let checkout_id = body
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Structural("id".into()))?;

        debug!("SumUp checkout {} created", checkout_id);
        Ok(checkout_id.to_string())
    }

    pub async fn get_payment_methods(
        &self,
        checkout_id: &str,
        access_token: &str,
    ) -> GatewayResult<Value> {
        let url = self.url(&format!("/checkouts/{checkout_id}/payment-methods"));
        let request = self.authorized(self.client.get(url), access_token)?;
        let response = request.send().await?;

        json_body(check_status(response).await?).await
    }

    pub async fn get_checkout(&self, checkout_id: &str, access_token: &str) -> GatewayResult<Value> {
        let url = self.url(&format!("/checkouts/{checkout_id}"));
        let request = self.authorized(self.client.get(url), access_token)?;
        let response = request.send().await?;

        json_body(check_status(response).await?).await
    }

    pub async fn cancel_checkout(&self, checkout_id: &str, access_token: &str) -> GatewayResult<()> {
        info!("Cancelling SumUp checkout {}", checkout_id);

        let url = self.url(&format!("/checkouts/{checkout_id}"));
        let request = self.authorized(self.client.delete(url), access_token)?;
        let response = request.send().await?;

        check_status(response).await?;
        Ok(())
    }

    /// Switches the checkout to iDEAL and returns the bank redirect URL.
    pub async fn process_ideal_checkout(
        &self,
        checkout_id: &str,
        access_token: &str,
    ) -> GatewayResult<String> {
        info!("Processing SumUp checkout {} with iDEAL", checkout_id);

        let url = self.url(&format!("/checkouts/{checkout_id}"));
        let request = self.authorized(self.client.put(url), access_token)?;
        let response = request
            .json(&json!({ "payment_type": "ideal" }))
            .send()
            .await?;

        let body = json_body(check_status(response).await?).await?;
        body.pointer("/next_step/full")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Structural("next_step.full".into()))
    }

    pub async fn get_transaction(
        &self,
        transaction_id: &str,
        access_token: &str,
    ) -> GatewayResult<Value> {
        let request = self.authorized(self.client.get(self.url("/me/transactions/")), access_token)?;
        let response = request.query(&[("id", transaction_id)]).send().await?;

        json_body(check_status(response).await?).await
    }

    /// Refunds a transaction. Without an amount, or with a zero amount, no
    /// body is sent and SumUp refunds the full transaction.
    pub async fn refund_transaction(
        &self,
        transaction_id: &str,
        access_token: &str,
        amount: Option<&BigDecimal>,
    ) -> GatewayResult<()> {
        let url = self.url(&format!("/me/refund/{transaction_id}"));
        let mut request = self.authorized(self.client.post(url), access_token)?;

        if let Some(amount) = partial_refund_amount(amount) {
            let value =
                to_wire_amount(amount).ok_or_else(|| GatewayError::InvalidAmount(amount.clone()))?;
            info!("Refunding {} of SumUp transaction {}", value, transaction_id);
            request = request.json(&json!({ "amount": value }));
        } else {
            info!("Refunding SumUp transaction {} in full", transaction_id);
        }

        check_status(request.send().await?).await?;
        Ok(())
    }
}

/// 4xx becomes `GatewayError::Api`, other non-success statuses are forwarded
/// as transport failures.
async fn check_status(response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_client_error() {
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            GatewayError::Structural(format!("HTTP {} with non-JSON body: {}", status.as_u16(), e))
        })?;
        let error = SumUpApiError::from_body(&body);
        warn!("SumUp returned HTTP {}: {}", status.as_u16(), error);
        return Err(GatewayError::Api(error));
    }

    Ok(response.error_for_status()?)
}

async fn json_body(response: Response) -> GatewayResult<Value> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| GatewayError::Structural(format!("invalid JSON: {e}")))
}
