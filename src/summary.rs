//! In-memory aggregates over a fetched list of expenses.
//!
//! Everything here is a single pass over the rows the caller already has; the
//! store is never queried. The totals feed the summary view, the charts, the
//! budget table and the PDF footer.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::database::models::{Category, Expense, PersonBudget};
use crate::error::{Error, Result};

fn add(acc: &mut Decimal, amount: Decimal) -> Result<()> {
    *acc = acc.checked_add(amount).ok_or(Error::Overflow)?;
    Ok(())
}

/// Sum that reports overflow instead of panicking.
pub fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a).ok_or(Error::Overflow))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayerTotal {
    pub payer: String,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: Decimal,
    pub count: usize,
    /// Every category, in declaration order, zero when unused.
    pub by_category: Vec<CategoryTotal>,
    /// Highest spender first; ties broken by name.
    pub by_payer: Vec<PayerTotal>,
    /// Ascending by day.
    pub by_day: Vec<DailyTotal>,
}

impl Summary {
    pub fn from_expenses(expenses: &[Expense]) -> Result<Self> {
        let mut total = Decimal::ZERO;
        let mut by_category: HashMap<Category, Decimal> = HashMap::new();
        let mut by_payer: HashMap<&str, (Decimal, usize)> = HashMap::new();
        let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

        for e in expenses {
            add(&mut total, e.amount)?;
            add(by_category.entry(e.category).or_default(), e.amount)?;
            let payer = by_payer.entry(e.payer.as_str()).or_default();
            add(&mut payer.0, e.amount)?;
            payer.1 += 1;
            add(by_day.entry(e.occurred_on).or_default(), e.amount)?;
        }

        let by_category = Category::ALL
            .iter()
            .map(|c| CategoryTotal {
                category: *c,
                total: by_category.get(c).copied().unwrap_or_default(),
            })
            .collect();

        let mut by_payer: Vec<PayerTotal> = by_payer
            .into_iter()
            .map(|(payer, (total, count))| PayerTotal {
                payer: payer.to_string(),
                total,
                count,
            })
            .collect();
        by_payer.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.payer.cmp(&b.payer)));

        let by_day = by_day
            .into_iter()
            .map(|(day, total)| DailyTotal { day, total })
            .collect();

        Ok(Self {
            total,
            count: expenses.len(),
            by_category,
            by_payer,
            by_day,
        })
    }

    pub fn spent_by(&self, payer: &str) -> Decimal {
        self.by_payer
            .iter()
            .find(|p| p.payer == payer)
            .map(|p| p.total)
            .unwrap_or_default()
    }

    /// Average spend per distinct payer.
    pub fn per_person(&self) -> Decimal {
        even_split(self.total, self.by_payer.len())
    }
}

/// An even share of `total` across `people`, to the cent. Zero when nobody.
pub fn even_split(total: Decimal, people: usize) -> Decimal {
    if people == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(people)).round_dp(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetStatus {
    Within,
    Over,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub payer: String,
    pub spent: Decimal,
    pub budget: Decimal,
    /// Negative when over budget.
    pub remaining: Decimal,
    pub status: BudgetStatus,
}

/// Joins per-payer spend with the budgets. Payers that spent without a budget
/// get a zero ceiling; budgets without spend show zero spent.
pub fn budget_report(summary: &Summary, budgets: &[PersonBudget]) -> Result<Vec<BudgetLine>> {
    let mut payers: Vec<&str> = budgets.iter().map(|b| b.payer.as_str()).collect();
    for p in &summary.by_payer {
        if !payers.contains(&p.payer.as_str()) {
            payers.push(p.payer.as_str());
        }
    }
    payers.sort_unstable();

    payers
        .into_iter()
        .map(|payer| {
            let spent = summary.spent_by(payer);
            let budget = budgets
                .iter()
                .find(|b| b.payer == payer)
                .map(|b| b.budget)
                .unwrap_or_default();
            let remaining = budget.checked_sub(spent).ok_or(Error::Overflow)?;
            Ok(BudgetLine {
                payer: payer.to_string(),
                spent,
                budget,
                remaining,
                status: if spent > budget {
                    BudgetStatus::Over
                } else {
                    BudgetStatus::Within
                },
            })
        })
        .collect()
}
