use crate::models::payment::{OrderPayment, PaymentLookup};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("payment store error: {0}")]
pub struct StoreError(pub String);

/// Access to the host application's payment records.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn find(&self, lookup: &PaymentLookup) -> Result<Option<OrderPayment>, StoreError>;
    async fn save(&self, payment: &OrderPayment) -> Result<(), StoreError>;
}

pub type PaymentStorage = Arc<DashMap<u64, OrderPayment>>;

#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentStore {
    storage: PaymentStorage,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, payment: OrderPayment) {
        self.storage.insert(payment.id, payment);
    }

    pub fn get(&self, id: u64) -> Option<OrderPayment> {
        self.storage.get(&id).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn find(&self, lookup: &PaymentLookup) -> Result<Option<OrderPayment>, StoreError> {
        Ok(self
            .storage
            .get(&lookup.payment_id)
            .filter(|entry| lookup.matches(entry.value()))
            .map(|entry| entry.clone()))
    }

    async fn save(&self, payment: &OrderPayment) -> Result<(), StoreError> {
        self.storage.insert(payment.id, payment.clone());
        Ok(())
    }
}
