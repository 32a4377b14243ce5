//! REST clients for the Fund Terminal backend
//!
//! [`FundApi`], [`PortfolioApi`] and [`InvestmentApi`] share one
//! [`ApiClient`]. Every call has a strict form returning
//! [`FundResult`](fund_core::FundResult) and an `*_or_demo` form that falls
//! back to the static catalogue in [`demo`] and reports where the data came
//! from through [`Fetched`].

pub mod config;
pub mod demo;
pub mod fetched;
pub mod funds;
pub mod http;
pub mod investments;
pub mod portfolio;

pub use config::ApiConfig;
pub use fetched::{Fetched, Origin};
pub use funds::FundApi;
pub use http::ApiClient;
pub use investments::InvestmentApi;
pub use portfolio::PortfolioApi;
