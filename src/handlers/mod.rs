pub mod checkout_event;
pub mod error;
pub mod ideal_checkout;
pub mod payment_widget;
pub mod payments;

pub use error::HandlerError;
