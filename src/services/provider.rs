use crate::models::checkout::{BuyerDetails, CheckoutState, CheckoutStatus, NewCheckout};
use crate::models::payment::{
    OrderPayment, PaymentState, INFO_CHECKOUT, INFO_CHECKOUT_ID, INFO_REFUNDS, INFO_TRANSACTION_ID,
};
use crate::services::payment_store::{PaymentStore, StoreError};
use crate::services::sumup_client::{GatewayError, SumUpClient};
use crate::utils::money::{format_amount, partial_refund_amount};
use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub access_token: String,
    pub merchant_code: String,
    pub public_url: String,
}

/// Connects host payment records to SumUp checkouts.
pub struct SumUpProvider {
    client: SumUpClient,
    settings: ProviderSettings,
    store: Arc<dyn PaymentStore>,
}

impl SumUpProvider {
    pub fn new(client: SumUpClient, settings: ProviderSettings, store: Arc<dyn PaymentStore>) -> Self {
        Self {
            client,
            settings,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn PaymentStore> {
        &self.store
    }

    pub fn return_url(&self, payment: &OrderPayment) -> String {
        format!(
            "{}/{}/sumup/return/{}/",
            self.settings.public_url.trim_end_matches('/'),
            payment.event,
            payment.id
        )
    }

    pub fn widget_url(&self, payment: &OrderPayment) -> String {
        format!(
            "{}/{}/sumup/widget/{}/{}/{}/",
            self.settings.public_url.trim_end_matches('/'),
            payment.event,
            payment.order_code,
            payment.order_secret,
            payment.id
        )
    }

    fn require_checkout_id(payment: &OrderPayment) -> Result<String, ProviderError> {
        payment
            .checkout_id()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Validation("No SumUp checkout ID found.".into()))
    }

    /// Creates the SumUp checkout for a payment and moves it to pending.
    pub async fn create_checkout_for(
        &self,
        payment: &mut OrderPayment,
        buyer: BuyerDetails,
    ) -> Result<String, ProviderError> {
        let checkout = NewCheckout {
            amount: payment.amount.clone(),
            currency: payment.currency.clone(),
            checkout_reference: payment.checkout_reference(),
            description: format!("Order {}", payment.order_code),
            merchant_code: self.settings.merchant_code.clone(),
            return_url: self.return_url(payment),
            redirect_url: self.widget_url(payment),
            buyer,
        };

        let checkout_id = self
            .client
            .create_checkout(&checkout, &self.settings.access_token)
            .await?;

        payment
            .info
            .insert(INFO_CHECKOUT_ID.into(), Value::String(checkout_id.clone()));
        payment.state = PaymentState::Pending;
        self.store.save(payment).await?;

        info!(
            "Payment {} of order {} linked to SumUp checkout {}",
            payment.id, payment.order_code, checkout_id
        );
        Ok(checkout_id)
    }

    /// Pulls the checkout status from SumUp and applies it to the payment.
    pub async fn synchronize_payment_status(
        &self,
        payment: &mut OrderPayment,
    ) -> Result<(), ProviderError> {
        if !payment.state.is_open() {
            return Ok(());
        }
        let Some(checkout_id) = payment.checkout_id().map(str::to_string) else {
            return Ok(());
        };

        let document = self
            .client
            .get_checkout(&checkout_id, &self.settings.access_token)
            .await?;
        let status: CheckoutStatus = serde_json::from_value(document.clone())
            .map_err(|e| GatewayError::Structural(format!("checkout document: {e}")))?;

        let previous = payment.state;
        match status.status {
            CheckoutState::Paid => {
                payment.state = PaymentState::Confirmed;
                if let Some(transaction_id) = status.paid_transaction_id() {
                    payment
                        .info
                        .insert(INFO_TRANSACTION_ID.into(), json!(transaction_id));
                }
            }
            CheckoutState::Failed | CheckoutState::Expired => payment.state = PaymentState::Failed,
            CheckoutState::Pending => {}
            CheckoutState::Unknown => {
                warn!("SumUp checkout {} has an unknown status", checkout_id);
            }
        }

        let changed = payment.info.get(INFO_CHECKOUT) != Some(&document) || previous != payment.state;
        payment.info.insert(INFO_CHECKOUT.into(), document);

        if changed {
            self.store.save(payment).await?;
        }
        if previous != payment.state {
            info!(
                "Payment {} moved from {:?} to {:?}",
                payment.id, previous, payment.state
            );
        }
        Ok(())
    }

    /// Starts an iDEAL payment and returns the bank redirect URL.
    pub async fn execute_ideal_payment(&self, payment: &OrderPayment) -> Result<String, ProviderError> {
        let checkout_id = Self::require_checkout_id(payment)?;
        let redirect_url = self
            .client
            .process_ideal_checkout(&checkout_id, &self.settings.access_token)
            .await?;
        Ok(redirect_url)
    }

    pub async fn payment_methods(&self, payment: &OrderPayment) -> Result<Value, ProviderError> {
        let checkout_id = Self::require_checkout_id(payment)?;
        Ok(self
            .client
            .get_payment_methods(&checkout_id, &self.settings.access_token)
            .await?)
    }

    pub async fn cancel_payment(&self, payment: &mut OrderPayment) -> Result<(), ProviderError> {
        let checkout_id = Self::require_checkout_id(payment)?;
        self.client
            .cancel_checkout(&checkout_id, &self.settings.access_token)
            .await?;

        payment.state = PaymentState::Canceled;
        self.store.save(payment).await?;
        Ok(())
    }

    pub async fn transaction(&self, payment: &OrderPayment) -> Result<Value, ProviderError> {
        let transaction_id = payment
            .transaction_id()
            .ok_or_else(|| ProviderError::Validation("No SumUp transaction ID found.".into()))?;
        Ok(self
            .client
            .get_transaction(transaction_id, &self.settings.access_token)
            .await?)
    }

    /// Refunds the payment's transaction. An amount equal to the payment
    /// amount is sent as a full refund.
    pub async fn refund_payment(
        &self,
        payment: &mut OrderPayment,
        amount: Option<&BigDecimal>,
    ) -> Result<(), ProviderError> {
        if payment.state != PaymentState::Confirmed {
            return Err(ProviderError::Validation(
                "Only confirmed payments can be refunded.".into(),
            ));
        }
        let transaction_id = payment
            .transaction_id()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Validation("No SumUp transaction ID found.".into()))?;

        let partial = partial_refund_amount(amount).filter(|value| **value != payment.amount);
        self.client
            .refund_transaction(&transaction_id, &self.settings.access_token, partial)
            .await?;

        let refunded = format_amount(partial.unwrap_or(&payment.amount));
        let entry = json!({ "amount": refunded, "full": partial.is_none() });
        match payment.info.get_mut(INFO_REFUNDS) {
            Some(Value::Array(refunds)) => refunds.push(entry),
            _ => {
                payment.info.insert(INFO_REFUNDS.into(), json!([entry]));
            }
        }
        if partial.is_none() {
            payment.state = PaymentState::Refunded;
        }
        self.store.save(payment).await?;

        info!("Refunded {} for payment {}", refunded, payment.id);
        Ok(())
    }
}
