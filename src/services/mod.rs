pub mod payment_store;
pub mod provider;
pub mod sumup_client;

pub use payment_store::{InMemoryPaymentStore, PaymentStore};
pub use provider::{ProviderError, ProviderSettings, SumUpProvider};
pub use sumup_client::{GatewayError, SumUpApiError, SumUpClient};
