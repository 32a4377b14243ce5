//! Mutual fund data structures

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad category of a scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundCategory {
    Equity,
    Debt,
    Hybrid,
    Index,
    Elss,
    Liquid,
}

impl FundCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            FundCategory::Equity => "Equity",
            FundCategory::Debt => "Debt",
            FundCategory::Hybrid => "Hybrid",
            FundCategory::Index => "Index",
            FundCategory::Elss => "ELSS",
            FundCategory::Liquid => "Liquid",
        }
    }
}

impl fmt::Display for FundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Riskometer level as published by the fund house
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    ModeratelyLow,
    Moderate,
    ModeratelyHigh,
    High,
    VeryHigh,
}

/// Trailing returns in percent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FundReturns {
    pub one_year: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub three_year: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub five_year: Option<Decimal>,
}

/// A mutual fund scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    /// Platform identifier for the scheme
    pub id: String,

    /// Scheme name
    pub name: String,

    pub category: FundCategory,

    pub risk_level: RiskLevel,

    /// Latest net asset value per unit
    pub nav: Decimal,

    /// Date the NAV was published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_date: Option<NaiveDate>,

    /// Assets under management, in crore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aum_crore: Option<Decimal>,

    /// Total expense ratio in percent
    pub expense_ratio: Decimal,

    #[serde(default)]
    pub returns: FundReturns,

    /// Minimum lumpsum amount
    pub min_investment: Decimal,

    /// Minimum monthly SIP amount, when SIP is offered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_sip_amount: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund_manager: Option<String>,
}

impl Fund {
    /// Whether the scheme accepts SIP investments
    pub fn supports_sip(&self) -> bool {
        self.min_sip_amount.is_some()
    }

    /// Case-insensitive match on name, id or category
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&query)
            || self.id.to_lowercase().contains(&query)
            || self.category.display_name().to_lowercase() == query
    }
}

/// One point of a NAV history series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: Decimal,
}

/// Side-by-side view of several funds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundComparison {
    pub funds: Vec<Fund>,
    /// Fund id with the highest one-year return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_one_year: Option<String>,
}

impl FundComparison {
    /// Build a comparison, computing the one-year leader
    pub fn new(funds: Vec<Fund>) -> Self {
        let best_one_year = funds
            .iter()
            .max_by(|a, b| a.returns.one_year.cmp(&b.returns.one_year))
            .map(|f| f.id.clone());
        Self {
            funds,
            best_one_year,
        }
    }
}

/// Filters for listing funds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FundFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FundCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_risk: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl FundFilter {
    /// Whether a fund passes this filter (limit is not considered)
    pub fn accepts(&self, fund: &Fund) -> bool {
        self.category.map_or(true, |c| fund.category == c)
            && self.max_risk.map_or(true, |r| fund.risk_level <= r)
    }

    /// Query string pairs for the REST call
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(category) = self.category {
            params.push(("category", serde_plain(&category)));
        }
        if let Some(risk) = self.max_risk {
            params.push(("max_risk", serde_plain(&risk)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

/// Wire name of a unit enum variant
fn serde_plain<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}
