// Utilitários para manipulação de valores monetários

use bigdecimal::{BigDecimal, Zero};

/// SumUp expects amounts as JSON floats. Parsing the decimal text gives the
/// nearest double; `ToPrimitive::to_f64` does not.
pub fn to_wire_amount(amount: &BigDecimal) -> Option<f64> {
    amount
        .to_string()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// A refund amount that is absent or zero means "refund everything".
pub fn partial_refund_amount(amount: Option<&BigDecimal>) -> Option<&BigDecimal> {
    amount.filter(|value| !value.is_zero())
}

pub fn format_amount(amount: &BigDecimal) -> String {
    amount.with_scale(2).to_string()
}
