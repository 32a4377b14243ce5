//! Static demo data
//!
//! Served by the `*_or_demo` calls when the backend is unreachable or
//! returns an error. Numbers are illustrative only.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, Months, NaiveDate, Utc};
use fund_core::{
    AllocationSlice, Fund, FundCategory, FundComparison, FundFilter, FundReturns, GrowthPeriod,
    GrowthPoint, Holding, InvestmentKind, InvestmentOrder, InvestmentRequest, NavPoint,
    OrderStatus, PortfolioSummary, RiskLevel,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

static NEXT_ORDER_ID: AtomicU64 = AtomicU64::new(2001);

/// Share of today's invested amount that was already invested at the start
/// of a growth window
const GROWTH_START_FRACTION: Decimal = dec!(0.6);

struct DemoFund {
    id: &'static str,
    name: &'static str,
    category: FundCategory,
    risk_level: RiskLevel,
    nav: Decimal,
    aum_crore: Decimal,
    expense_ratio: Decimal,
    returns: (Decimal, Option<Decimal>, Option<Decimal>),
    min_investment: Decimal,
    min_sip_amount: Option<Decimal>,
    fund_manager: &'static str,
}

const CATALOGUE: &[DemoFund] = &[
    DemoFund {
        id: "MERIDIAN-FLEXI",
        name: "Meridian Flexi Cap Fund",
        category: FundCategory::Equity,
        risk_level: RiskLevel::VeryHigh,
        nav: dec!(78.42),
        aum_crore: dec!(71240),
        expense_ratio: dec!(0.63),
        returns: (dec!(32.8), Some(dec!(21.4)), Some(dec!(25.9))),
        min_investment: dec!(1000),
        min_sip_amount: Some(dec!(1000)),
        fund_manager: "R. Iyer",
    },
    DemoFund {
        id: "HARBOUR-MIDCAP",
        name: "Harbour Mid Cap Opportunities Fund",
        category: FundCategory::Equity,
        risk_level: RiskLevel::VeryHigh,
        nav: dec!(182.35),
        aum_crore: dec!(64810),
        expense_ratio: dec!(0.77),
        returns: (dec!(45.1), Some(dec!(28.6)), Some(dec!(29.3))),
        min_investment: dec!(100),
        min_sip_amount: Some(dec!(100)),
        fund_manager: "S. Mehta",
    },
    DemoFund {
        id: "LANTERN-BAF",
        name: "Lantern Balanced Advantage Fund",
        category: FundCategory::Hybrid,
        risk_level: RiskLevel::ModeratelyHigh,
        nav: dec!(68.90),
        aum_crore: dec!(55120),
        expense_ratio: dec!(0.86),
        returns: (dec!(18.2), Some(dec!(13.1)), Some(dec!(14.0))),
        min_investment: dec!(500),
        min_sip_amount: Some(dec!(100)),
        fund_manager: "A. Kulkarni",
    },
    DemoFund {
        id: "SUMMIT-NIFTY50",
        name: "Summit Nifty 50 Index Fund",
        category: FundCategory::Index,
        risk_level: RiskLevel::VeryHigh,
        nav: dec!(158.21),
        aum_crore: dec!(18930),
        expense_ratio: dec!(0.18),
        returns: (dec!(26.4), Some(dec!(15.2)), Some(dec!(17.8))),
        min_investment: dec!(500),
        min_sip_amount: Some(dec!(500)),
        fund_manager: "N. Shah",
    },
    DemoFund {
        id: "ORCHID-ELSS",
        name: "Orchid ELSS Tax Saver Fund",
        category: FundCategory::Elss,
        risk_level: RiskLevel::VeryHigh,
        nav: dec!(94.17),
        aum_crore: dec!(36480),
        expense_ratio: dec!(0.79),
        returns: (dec!(27.9), Some(dec!(9.8)), Some(dec!(14.6))),
        min_investment: dec!(500),
        min_sip_amount: Some(dec!(500)),
        fund_manager: "K. Menon",
    },
    DemoFund {
        id: "KESTREL-CORPBOND",
        name: "Kestrel Corporate Bond Fund",
        category: FundCategory::Debt,
        risk_level: RiskLevel::Moderate,
        nav: dec!(3542.18),
        aum_crore: dec!(14220),
        expense_ratio: dec!(0.35),
        returns: (dec!(7.9), Some(dec!(5.8)), Some(dec!(6.9))),
        min_investment: dec!(5000),
        min_sip_amount: Some(dec!(1000)),
        fund_manager: "P. Rao",
    },
    DemoFund {
        id: "WILLOW-LIQUID",
        name: "Willow Liquid Fund",
        category: FundCategory::Liquid,
        risk_level: RiskLevel::ModeratelyLow,
        nav: dec!(3921.55),
        aum_crore: dec!(58760),
        expense_ratio: dec!(0.19),
        returns: (dec!(7.3), Some(dec!(6.1)), Some(dec!(5.3))),
        min_investment: dec!(5000),
        min_sip_amount: None,
        fund_manager: "D. Pillai",
    },
];

/// fund id, units, average NAV paid
const HOLDINGS: &[(&str, Decimal, Decimal)] = &[
    ("MERIDIAN-FLEXI", dec!(512.340), dec!(58.10)),
    ("HARBOUR-MIDCAP", dec!(210.500), dec!(121.40)),
    ("SUMMIT-NIFTY50", dec!(300.000), dec!(131.75)),
    ("WILLOW-LIQUID", dec!(12.750), dec!(3702.10)),
];

impl DemoFund {
    fn to_fund(&self) -> Fund {
        let (one_year, three_year, five_year) = self.returns;
        Fund {
            id: self.id.to_string(),
            name: self.name.to_string(),
            category: self.category,
            risk_level: self.risk_level,
            nav: self.nav,
            nav_date: None,
            aum_crore: Some(self.aum_crore),
            expense_ratio: self.expense_ratio,
            returns: FundReturns {
                one_year,
                three_year,
                five_year,
            },
            min_investment: self.min_investment,
            min_sip_amount: self.min_sip_amount,
            fund_manager: Some(self.fund_manager.to_string()),
        }
    }
}

// ============================================================================
// Funds
// ============================================================================

/// The whole demo catalogue
pub fn funds() -> Vec<Fund> {
    CATALOGUE.iter().map(DemoFund::to_fund).collect()
}

/// Catalogue entries passing `filter`, honouring its limit
pub fn filter_funds(filter: &FundFilter) -> Vec<Fund> {
    let matching = funds().into_iter().filter(|f| filter.accepts(f));
    match filter.limit {
        Some(limit) => matching.take(limit as usize).collect(),
        None => matching.collect(),
    }
}

pub fn fund(id: &str) -> Option<Fund> {
    CATALOGUE
        .iter()
        .find(|f| f.id.eq_ignore_ascii_case(id))
        .map(DemoFund::to_fund)
}

pub fn search(query: &str) -> Vec<Fund> {
    funds().into_iter().filter(|f| f.matches_query(query)).collect()
}

/// Compare the catalogue entries among `ids`; unknown ids are skipped
pub fn compare(ids: &[&str]) -> FundComparison {
    FundComparison::new(ids.iter().filter_map(|id| fund(id)).collect())
}

/// Monthly NAV points ending at today's NAV, derived from the one-year return
pub fn nav_history(id: &str, period: GrowthPeriod) -> Vec<NavPoint> {
    let Some(fund) = fund(id) else {
        return Vec::new();
    };

    let months = period.months();
    let yearly = fund.returns.one_year / dec!(100);
    monthly_dates(months)
        .map(|(months_back, date)| {
            let years_back = Decimal::from(months_back) / dec!(12);
            NavPoint {
                date,
                nav: (fund.nav / (Decimal::ONE + yearly * years_back)).round_dp(4),
            }
        })
        .collect()
}

// ============================================================================
// Portfolio
// ============================================================================

pub fn holdings() -> Vec<Holding> {
    HOLDINGS
        .iter()
        .filter_map(|(id, units, avg_nav)| {
            let fund = fund(id)?;
            Some(Holding {
                fund_id: fund.id,
                fund_name: fund.name,
                category: fund.category,
                units: *units,
                avg_nav: *avg_nav,
                current_nav: fund.nav,
                invested: (units * avg_nav).round_dp(2),
                current_value: (units * fund.nav).round_dp(2),
            })
        })
        .collect()
}

pub fn summary() -> PortfolioSummary {
    PortfolioSummary {
        xirr: Some(dec!(17.84)),
        day_change: dec!(1240.50),
        ..PortfolioSummary::from_holdings(&holdings()).unwrap_or_default()
    }
}

pub fn allocation() -> Vec<AllocationSlice> {
    AllocationSlice::from_holdings(&holdings()).unwrap_or_default()
}

/// Invested vs value, one point per month, ending at the demo summary
pub fn growth(period: GrowthPeriod) -> Vec<GrowthPoint> {
    let summary = summary();
    let months = Decimal::from(period.months());
    let return_ratio = if summary.total_invested.is_zero() {
        Decimal::ZERO
    } else {
        summary.total_returns / summary.total_invested
    };

    monthly_dates(period.months())
        .map(|(months_back, date)| {
            let progress = (months - Decimal::from(months_back)) / months;
            let invested = summary.total_invested
                * (GROWTH_START_FRACTION + (Decimal::ONE - GROWTH_START_FRACTION) * progress);
            GrowthPoint {
                date,
                invested: invested.round_dp(2),
                value: (invested * (Decimal::ONE + return_ratio * progress)).round_dp(2),
            }
        })
        .collect()
}

// ============================================================================
// Orders
// ============================================================================

pub fn orders() -> Vec<InvestmentOrder> {
    let now = Utc::now();
    vec![
        InvestmentOrder {
            order_id: "DEMO-1001".to_string(),
            fund_id: "MERIDIAN-FLEXI".to_string(),
            amount: dec!(25000),
            kind: InvestmentKind::Lumpsum,
            status: OrderStatus::Confirmed,
            payment_url: None,
            created_at: now - Duration::days(30),
        },
        InvestmentOrder {
            order_id: "DEMO-1002".to_string(),
            fund_id: "SUMMIT-NIFTY50".to_string(),
            amount: dec!(5000),
            kind: InvestmentKind::Sip,
            status: OrderStatus::Processing,
            payment_url: None,
            created_at: now - Duration::days(2),
        },
    ]
}

/// Pending order for a request that could not reach the backend
pub fn new_order(request: &InvestmentRequest) -> InvestmentOrder {
    InvestmentOrder {
        order_id: format!("DEMO-{}", NEXT_ORDER_ID.fetch_add(1, Ordering::Relaxed)),
        fund_id: request.fund_id.clone(),
        amount: request.amount,
        kind: request.kind,
        status: OrderStatus::Pending,
        payment_url: None,
        created_at: Utc::now(),
    }
}

/// `(months back, date)` from `months` ago up to today, oldest first
fn monthly_dates(months: u32) -> impl Iterator<Item = (u32, NaiveDate)> {
    let today = Utc::now().date_naive();
    (0..=months).rev().filter_map(move |back| {
        today
            .checked_sub_months(Months::new(back))
            .map(|date| (back, date))
    })
}
