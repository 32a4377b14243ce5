//! Investment orders

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FundError;
use crate::fund::Fund;

/// How the money goes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentKind {
    /// One-off purchase
    Lumpsum,
    /// Monthly systematic investment plan
    Sip,
}

/// Request to start an investment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRequest {
    pub fund_id: String,
    pub amount: Decimal,
    pub kind: InvestmentKind,
    /// Day of month the SIP debits on (1..=28)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sip_day: Option<u8>,
}

impl InvestmentRequest {
    pub fn lumpsum(fund_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            fund_id: fund_id.into(),
            amount,
            kind: InvestmentKind::Lumpsum,
            sip_day: None,
        }
    }

    pub fn sip(fund_id: impl Into<String>, amount: Decimal, sip_day: u8) -> Self {
        Self {
            fund_id: fund_id.into(),
            amount,
            kind: InvestmentKind::Sip,
            sip_day: Some(sip_day),
        }
    }

    /// Check the request before it leaves the client
    pub fn validate(&self) -> Result<(), FundError> {
        if self.fund_id.trim().is_empty() {
            return Err(FundError::validation("fund_id is required"));
        }
        if self.amount <= Decimal::ZERO {
            return Err(FundError::validation(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        match (self.kind, self.sip_day) {
            (InvestmentKind::Sip, None) => {
                Err(FundError::validation("SIP investments need a sip_day"))
            }
            (InvestmentKind::Sip, Some(day)) if !(1..=28).contains(&day) => Err(
                FundError::validation(format!("sip_day must be between 1 and 28, got {}", day)),
            ),
            (InvestmentKind::Lumpsum, Some(_)) => {
                Err(FundError::validation("sip_day is only valid for SIP investments"))
            }
            _ => Ok(()),
        }
    }

    /// Validate against the fund's minimums as well
    pub fn validate_for(&self, fund: &Fund) -> Result<(), FundError> {
        self.validate()?;
        if fund.id != self.fund_id {
            return Err(FundError::validation(format!(
                "request is for {}, not {}",
                self.fund_id, fund.id
            )));
        }
        let minimum = match self.kind {
            InvestmentKind::Lumpsum => fund.min_investment,
            InvestmentKind::Sip => fund.min_sip_amount.ok_or_else(|| {
                FundError::validation(format!("{} does not accept SIP investments", fund.name))
            })?,
        };
        if self.amount < minimum {
            return Err(FundError::validation(format!(
                "minimum amount for {} is {}",
                fund.name, minimum
            )));
        }
        Ok(())
    }
}

/// Lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, waiting for payment
    Pending,
    /// Payment received, units being allotted
    Processing,
    Confirmed,
    Failed,
    Cancelled,
}

impl OrderStatus {
    /// No further transitions expected
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed | OrderStatus::Failed | OrderStatus::Cancelled
        )
    }
}

/// An investment order as tracked by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentOrder {
    pub order_id: String,
    pub fund_id: String,
    pub amount: Decimal,
    pub kind: InvestmentKind,
    pub status: OrderStatus,
    /// Where to send the user to pay, for pending orders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
