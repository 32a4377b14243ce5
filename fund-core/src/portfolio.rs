//! Portfolio tracking structures

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{FundError, FundResult};
use crate::fund::FundCategory;

/// A holding in a single fund
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub fund_id: String,

    pub fund_name: String,

    pub category: FundCategory,

    /// Units held
    pub units: Decimal,

    /// Average NAV paid per unit
    pub avg_nav: Decimal,

    /// Latest NAV
    pub current_nav: Decimal,

    /// Amount invested
    pub invested: Decimal,

    /// Market value at `current_nav`
    pub current_value: Decimal,
}

impl Holding {
    /// Absolute gain; `None` if the figures are too large to subtract
    pub fn gain(&self) -> Option<Decimal> {
        self.current_value.checked_sub(self.invested)
    }

    /// Gain as a percentage of the amount invested
    pub fn gain_percent(&self) -> Option<Decimal> {
        percent_of(self.gain()?, self.invested)
    }
}

/// Headline numbers for the portfolio
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_invested: Decimal,
    pub current_value: Decimal,
    pub total_returns: Decimal,
    pub returns_percent: Decimal,
    /// Annualised return, when the backend computes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xirr: Option<Decimal>,
    #[serde(default)]
    pub day_change: Decimal,
    pub holdings_count: usize,
}

impl PortfolioSummary {
    /// Summarise a list of holdings
    pub fn from_holdings(holdings: &[Holding]) -> FundResult<Self> {
        let total_invested = checked_sum(holdings.iter().map(|h| h.invested))
            .ok_or_else(|| overflow("total invested"))?;
        let current_value = checked_sum(holdings.iter().map(|h| h.current_value))
            .ok_or_else(|| overflow("current value"))?;
        let total_returns = current_value
            .checked_sub(total_invested)
            .ok_or_else(|| overflow("total returns"))?;
        let returns_percent =
            percent_of(total_returns, total_invested).ok_or_else(|| overflow("returns percent"))?;

        Ok(Self {
            total_invested,
            current_value,
            total_returns,
            returns_percent,
            xirr: None,
            day_change: Decimal::ZERO,
            holdings_count: holdings.len(),
        })
    }
}

/// Share of the portfolio in one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub category: FundCategory,
    pub value: Decimal,
    #[serde(default)]
    pub percent: Decimal,
}

impl AllocationSlice {
    /// Group holdings by category, largest slice first
    pub fn from_holdings(holdings: &[Holding]) -> FundResult<Vec<AllocationSlice>> {
        let mut by_category: BTreeMap<String, (FundCategory, Decimal)> = BTreeMap::new();
        for holding in holdings {
            let entry = by_category
                .entry(holding.category.display_name().to_string())
                .or_insert((holding.category, Decimal::ZERO));
            entry.1 = entry
                .1
                .checked_add(holding.current_value)
                .ok_or_else(|| overflow("allocation value"))?;
        }

        let mut slices: Vec<AllocationSlice> = by_category
            .into_values()
            .map(|(category, value)| AllocationSlice {
                category,
                value,
                percent: Decimal::ZERO,
            })
            .collect();
        Self::fill_percentages(&mut slices)?;
        slices.sort_by(|a, b| b.value.cmp(&a.value));
        Ok(slices)
    }

    /// Compute `percent` for slices the server sent without one
    ///
    /// Fails with [`FundError::Parse`] when the values are too large to total.
    pub fn fill_percentages(slices: &mut [AllocationSlice]) -> FundResult<()> {
        if slices.iter().all(|s| !s.percent.is_zero()) {
            return Ok(());
        }
        let total =
            checked_sum(slices.iter().map(|s| s.value)).ok_or_else(|| overflow("allocation total"))?;
        for slice in slices.iter_mut() {
            if slice.percent.is_zero() {
                slice.percent =
                    percent_of(slice.value, total).ok_or_else(|| overflow("allocation percent"))?;
            }
        }
        Ok(())
    }
}

/// One point on the invested-vs-value growth chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub invested: Decimal,
    pub value: Decimal,
}

/// Time window for growth and NAV history charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GrowthPeriod {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[default]
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "ALL")]
    All,
}

impl GrowthPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthPeriod::OneMonth => "1M",
            GrowthPeriod::ThreeMonths => "3M",
            GrowthPeriod::SixMonths => "6M",
            GrowthPeriod::OneYear => "1Y",
            GrowthPeriod::ThreeYears => "3Y",
            GrowthPeriod::FiveYears => "5Y",
            GrowthPeriod::All => "ALL",
        }
    }

    /// Approximate number of months covered (`All` counts as ten years)
    pub fn months(&self) -> u32 {
        match self {
            GrowthPeriod::OneMonth => 1,
            GrowthPeriod::ThreeMonths => 3,
            GrowthPeriod::SixMonths => 6,
            GrowthPeriod::OneYear => 12,
            GrowthPeriod::ThreeYears => 36,
            GrowthPeriod::FiveYears => 60,
            GrowthPeriod::All => 120,
        }
    }
}

impl fmt::Display for GrowthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `part / whole * 100`, rounded to two places; zero when `whole` is zero
fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole.is_zero() {
        return Some(Decimal::ZERO);
    }
    let ratio = part.checked_div(whole)?;
    Some(ratio.checked_mul(Decimal::ONE_HUNDRED)?.round_dp(2))
}

fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(value))
}

fn overflow(what: &str) -> FundError {
    FundError::parse(format!("{} out of range", what))
}
