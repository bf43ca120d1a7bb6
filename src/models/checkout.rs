use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Buyer contact and address fields. Everything defaults to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuyerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country: String,
    pub city: String,
    pub line1: String,
    pub line2: String,
    pub postal_code: String,
    pub state: String,
}

/// Input of `SumUpClient::create_checkout`.
#[derive(Debug, Clone)]
pub struct NewCheckout {
    pub amount: BigDecimal,
    pub currency: String,
    pub checkout_reference: String,
    pub description: String,
    pub merchant_code: String,
    pub return_url: String,
    pub redirect_url: String,
    pub buyer: BuyerDetails,
}

// Payload enviado para POST /checkouts
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest<'a> {
    pub checkout_reference: &'a str,
    pub description: &'a str,
    pub amount: f64,
    pub currency: &'a str,
    pub merchant_code: &'a str,
    pub return_url: &'a str,
    pub redirect_url: &'a str,
    pub personal_details: PersonalDetails<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonalDetails<'a> {
    pub address: Address<'a>,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Address<'a> {
    pub city: &'a str,
    pub country: &'a str,
    pub line1: &'a str,
    pub line2: &'a str,
    pub postal_code: &'a str,
    pub state: &'a str,
}

impl<'a> CheckoutRequest<'a> {
    pub fn new(checkout: &'a NewCheckout, amount: f64) -> Self {
        let buyer = &checkout.buyer;
        Self {
            checkout_reference: &checkout.checkout_reference,
            description: &checkout.description,
            amount,
            currency: &checkout.currency,
            merchant_code: &checkout.merchant_code,
            return_url: &checkout.return_url,
            redirect_url: &checkout.redirect_url,
            personal_details: PersonalDetails {
                address: Address {
                    city: &buyer.city,
                    country: &buyer.country,
                    line1: &buyer.line1,
                    line2: &buyer.line2,
                    postal_code: &buyer.postal_code,
                    state: &buyer.state,
                },
                email: &buyer.email,
                first_name: &buyer.first_name,
                last_name: &buyer.last_name,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckoutState {
    Pending,
    Paid,
    Failed,
    Expired,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutTransaction {
    pub id: String,
    #[serde(default)]
    pub transaction_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Subset of the checkout document that drives payment state changes.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutStatus {
    pub id: String,
    pub status: CheckoutState,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub transactions: Vec<CheckoutTransaction>,
}

impl CheckoutStatus {
    /// Prefers the top level `transaction_id`, then the first successful
    /// transaction, then any transaction.
    pub fn paid_transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref().or_else(|| {
            self.transactions
                .iter()
                .find(|t| t.status.as_deref() == Some("SUCCESSFUL"))
                .or_else(|| self.transactions.first())
                .map(|t| t.id.as_str())
        })
    }
}
