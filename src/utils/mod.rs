pub mod csp;
pub mod locale;
pub mod money;
