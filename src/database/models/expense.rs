use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Category;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub expense_id: i64,
    pub payer: String,                 // trip member who paid
    pub category: Category,
    pub amount: Decimal,
    pub description: Option<String>,
    pub occurred_on: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// Body of a create or a full update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub payer: String,
    pub category: Category,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    pub occurred_on: NaiveDate,
}

/// Largest accepted amount or budget, in whole currency units.
pub const MAX_AMOUNT: i64 = 1_000_000_000;

/// Checks a money value against `0..=MAX_AMOUNT` and rounds it to cents.
/// `field` names the value in the error message.
pub fn checked_money(field: &str, value: Decimal) -> Result<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::validation(format!("{field} must not be negative")));
    }
    if value > Decimal::from(MAX_AMOUNT) {
        return Err(Error::validation(format!(
            "{field} must not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(value.round_dp(2))
}

impl NewExpense {
    /// Trims text fields, rounds the amount to cents and checks the row invariants.
    pub fn validate(mut self) -> Result<Self> {
        self.payer = self.payer.trim().to_string();
        if self.payer.is_empty() {
            return Err(Error::validation("Payer is required"));
        }
        self.amount = checked_money("Amount", self.amount)?;
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(self)
    }
}

/// Optional filters shared by the list, summary and export operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseFilter {
    #[serde(default)]
    pub payer: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn is_empty(&self) -> bool {
        self.payer.is_none() && self.category.is_none() && self.from.is_none() && self.to.is_none()
    }

    pub fn matches(&self, e: &Expense) -> bool {
        self.payer.as_deref().map_or(true, |p| p == e.payer)
            && self.category.map_or(true, |c| c == e.category)
            && self.from.map_or(true, |d| e.occurred_on >= d)
            && self.to.map_or(true, |d| e.occurred_on <= d)
    }

    /// Human readable description, e.g. for the PDF header.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "All expenses".into();
        }
        let mut parts = Vec::new();
        if let Some(p) = &self.payer {
            parts.push(format!("payer {p}"));
        }
        if let Some(c) = self.category {
            parts.push(format!("category {c}"));
        }
        match (self.from, self.to) {
            (Some(f), Some(t)) => parts.push(format!("{f} to {t}")),
            (Some(f), None) => parts.push(format!("from {f}")),
            (None, Some(t)) => parts.push(format!("until {t}")),
            (None, None) => {}
        }
        parts.join(", ")
    }
}
