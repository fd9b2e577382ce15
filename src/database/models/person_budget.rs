use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonBudget {
    pub payer: String,
    pub budget: Decimal,    // spending ceiling
}
