//! Portfolio endpoints

use fund_core::{AllocationSlice, FundResult, GrowthPeriod, GrowthPoint, Holding, PortfolioSummary};
use tracing::{debug, instrument};

use crate::demo;
use crate::fetched::{or_demo, Fetched};
use crate::http::ApiClient;

/// Client for `/portfolio`
#[derive(Debug, Clone)]
pub struct PortfolioApi {
    http: ApiClient,
}

impl PortfolioApi {
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> FundResult<PortfolioSummary> {
        self.http.get(&["portfolio", "summary"], &[]).await
    }

    pub async fn summary_or_demo(&self) -> Fetched<PortfolioSummary> {
        or_demo(self.summary().await, "summary", demo::summary)
    }

    /// Invested vs current value over `period`
    #[instrument(skip(self))]
    pub async fn growth(&self, period: GrowthPeriod) -> FundResult<Vec<GrowthPoint>> {
        self.http
            .get(&["portfolio", "growth"], &[("period", period.to_string())])
            .await
    }

    pub async fn growth_or_demo(&self, period: GrowthPeriod) -> Fetched<Vec<GrowthPoint>> {
        or_demo(self.growth(period).await, "growth", || demo::growth(period))
    }

    /// Allocation by category; percentages are filled in when the server omits them
    #[instrument(skip(self))]
    pub async fn allocation(&self) -> FundResult<Vec<AllocationSlice>> {
        let mut slices: Vec<AllocationSlice> =
            self.http.get(&["portfolio", "allocation"], &[]).await?;
        AllocationSlice::fill_percentages(&mut slices)?;
        debug!("[FundApi] Allocation across {} categories", slices.len());
        Ok(slices)
    }

    pub async fn allocation_or_demo(&self) -> Fetched<Vec<AllocationSlice>> {
        or_demo(self.allocation().await, "allocation", demo::allocation)
    }

    #[instrument(skip(self))]
    pub async fn holdings(&self) -> FundResult<Vec<Holding>> {
        self.http.get(&["portfolio", "holdings"], &[]).await
    }

    pub async fn holdings_or_demo(&self) -> Fetched<Vec<Holding>> {
        or_demo(self.holdings().await, "holdings", demo::holdings)
    }
}
