#![allow(dead_code)]

use bigdecimal::BigDecimal;
use serde_json::{json, Map};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sumup_gateway::models::payment::{OrderPayment, PaymentState, INFO_CHECKOUT_ID};
use sumup_gateway::services::{InMemoryPaymentStore, ProviderSettings, SumUpClient, SumUpProvider};

pub const TOKEN: &str = "sup_sk_test";

pub fn client(base_url: &str) -> SumUpClient {
    SumUpClient::new(base_url, Duration::from_secs(5)).unwrap()
}

pub fn payment(state: PaymentState, checkout_id: Option<&str>) -> OrderPayment {
    let mut info = Map::new();
    if let Some(id) = checkout_id {
        info.insert(INFO_CHECKOUT_ID.into(), json!(id));
    }
    OrderPayment {
        id: 42,
        event: "democon".into(),
        order_code: "ABC12".into(),
        order_secret: "s3cr3t".into(),
        order_email: "buyer@example.org".into(),
        amount: BigDecimal::from_str("23.50").unwrap(),
        currency: "EUR".into(),
        state,
        info,
    }
}

pub fn provider(base_url: &str, store: Arc<InMemoryPaymentStore>) -> SumUpProvider {
    let settings = ProviderSettings {
        access_token: TOKEN.into(),
        merchant_code: "MC123".into(),
        public_url: "https://tickets.example".into(),
    };
    SumUpProvider::new(client(base_url), settings, store)
}
