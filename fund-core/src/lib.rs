//! Core types for the Fund Terminal
//!
//! This crate defines the shared data structures used by the realtime
//! client, the REST clients and the binary: topics and wire envelopes,
//! fund and portfolio models, and the common error type.

pub mod config;
pub mod error;
pub mod fund;
pub mod investment;
pub mod portfolio;
pub mod realtime;

pub use config::ConfigError;
pub use error::{FundError, FundResult};
pub use fund::{Fund, FundCategory, FundComparison, FundFilter, FundReturns, NavPoint, RiskLevel};
pub use investment::{InvestmentKind, InvestmentOrder, InvestmentRequest, OrderStatus};
pub use portfolio::{AllocationSlice, GrowthPeriod, GrowthPoint, Holding, PortfolioSummary};
pub use realtime::{
    ConnectionStatus, ControlMessage, HoldingDelta, InboundMessage, MarketTick, ModelPrediction,
    PortfolioDelta, RiskAlert, Severity, Signal, Topic, UserEvent,
};
