use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const INFO_CHECKOUT_ID: &str = "sumup_checkout_id";
pub const INFO_CHECKOUT: &str = "sumup_checkout";
pub const INFO_TRANSACTION_ID: &str = "sumup_transaction_id";
pub const INFO_REFUNDS: &str = "sumup_refunds";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Created,
    Pending,
    Confirmed,
    Canceled,
    Failed,
    Refunded,
}

impl PaymentState {
    /// States in which the checkout on SumUp can still change.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Created | Self::Pending | Self::Failed)
    }
}

/// Payment record owned by the ticketing host. Only `state` and `info`
/// are written from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayment {
    pub id: u64,
    pub event: String,
    pub order_code: String,
    pub order_secret: String,
    pub order_email: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub state: PaymentState,
    #[serde(default)]
    pub info: Map<String, Value>,
}

impl OrderPayment {
    pub fn checkout_id(&self) -> Option<&str> {
        self.info
            .get(INFO_CHECKOUT_ID)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.info
            .get(INFO_TRANSACTION_ID)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn checkout_reference(&self) -> String {
        format!("{}-{}-P-{}", self.event, self.order_code, self.id)
    }
}

/// Scope used to resolve a payment from URL parameters.
#[derive(Debug, Clone, Default)]
pub struct PaymentLookup {
    pub event: String,
    pub payment_id: u64,
    pub order_code: Option<String>,
    pub order_secret: Option<String>,
}

impl PaymentLookup {
    pub fn in_event(event: impl Into<String>, payment_id: u64) -> Self {
        Self {
            event: event.into(),
            payment_id,
            ..Default::default()
        }
    }

    pub fn with_order(mut self, code: impl Into<String>, secret: impl Into<String>) -> Self {
        self.order_code = Some(code.into());
        self.order_secret = Some(secret.into());
        self
    }

    pub fn matches(&self, payment: &OrderPayment) -> bool {
        payment.id == self.payment_id
            && payment.event == self.event
            && self
                .order_code
                .as_deref()
                .map_or(true, |code| code == payment.order_code)
            && self
                .order_secret
                .as_deref()
                .map_or(true, |secret| secret == payment.order_secret)
    }
}
