//! Fund catalogue endpoints

use fund_core::{
    Fund, FundComparison, FundError, FundFilter, FundResult, GrowthPeriod, NavPoint,
};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::demo;
use crate::fetched::{or_demo, Fetched};
use crate::http::ApiClient;

#[derive(Serialize)]
struct CompareRequest<'a> {
    fund_ids: &'a [&'a str],
}

/// Client for `/funds`
#[derive(Debug, Clone)]
pub struct FundApi {
    http: ApiClient,
}

impl FundApi {
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    /// List funds matching `filter`
    #[instrument(skip(self))]
    pub async fn list_funds(&self, filter: &FundFilter) -> FundResult<Vec<Fund>> {
        let funds: Vec<Fund> = self.http.get(&["funds"], &filter.query_pairs()).await?;
        debug!("[FundApi] Listed {} funds", funds.len());
        Ok(funds)
    }

    pub async fn list_funds_or_demo(&self, filter: &FundFilter) -> Fetched<Vec<Fund>> {
        or_demo(self.list_funds(filter).await, "list_funds", || {
            demo::filter_funds(filter)
        })
    }

    /// Get a single fund by id
    #[instrument(skip(self))]
    pub async fn get_fund(&self, id: &str) -> FundResult<Fund> {
        let id = non_empty("fund id", id)?;
        self.http.get(&["funds", id], &[]).await
    }

    /// Falls back to the demo catalogue; ids it does not know keep the live error
    pub async fn get_fund_or_demo(&self, id: &str) -> FundResult<Fetched<Fund>> {
        match self.get_fund(id).await {
            Ok(fund) => Ok(Fetched::live(fund)),
            Err(e) if e.is_validation() => Err(e),
            Err(e) => match demo::fund(id) {
                Some(fund) => Ok(or_demo(Err(e), "get_fund", || fund)),
                None => Err(e),
            },
        }
    }

    /// Free-text search; an empty query matches nothing and sends no request
    #[instrument(skip(self))]
    pub async fn search_funds(&self, query: &str) -> FundResult<Vec<Fund>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.http
            .get(&["funds", "search"], &[("q", query.to_string())])
            .await
    }

    pub async fn search_funds_or_demo(&self, query: &str) -> Fetched<Vec<Fund>> {
        or_demo(self.search_funds(query).await, "search_funds", || {
            demo::search(query)
        })
    }

    /// Side-by-side comparison of at least two distinct funds
    #[instrument(skip(self))]
    pub async fn compare_funds(&self, ids: &[&str]) -> FundResult<FundComparison> {
        let ids = distinct_ids(ids)?;
        let comparison: FundComparison = self
            .http
            .post(&["funds", "compare"], &CompareRequest { fund_ids: &ids })
            .await?;

        if comparison.best_one_year.is_none() {
            return Ok(FundComparison::new(comparison.funds));
        }
        Ok(comparison)
    }

    pub async fn compare_funds_or_demo(&self, ids: &[&str]) -> FundResult<Fetched<FundComparison>> {
        let distinct = distinct_ids(ids)?;
        Ok(or_demo(self.compare_funds(ids).await, "compare_funds", || {
            demo::compare(&distinct)
        }))
    }

    /// NAV series for `period`
    #[instrument(skip(self))]
    pub async fn nav_history(&self, id: &str, period: GrowthPeriod) -> FundResult<Vec<NavPoint>> {
        let id = non_empty("fund id", id)?;
        self.http
            .get(&["funds", id, "nav"], &[("period", period.to_string())])
            .await
    }

    /// Falls back to the demo series; a blank id is still an error
    pub async fn nav_history_or_demo(
        &self,
        id: &str,
        period: GrowthPeriod,
    ) -> FundResult<Fetched<Vec<NavPoint>>> {
        match self.nav_history(id, period).await {
            Err(e) if e.is_validation() => Err(e),
            result => Ok(or_demo(result, "nav_history", || {
                demo::nav_history(id.trim(), period)
            })),
        }
    }
}

fn non_empty<'a>(what: &str, value: &'a str) -> FundResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FundError::validation(format!("{} is required", what)));
    }
    Ok(trimmed)
}

/// Trimmed, de-duplicated ids; comparing needs at least two
fn distinct_ids<'a>(ids: &[&'a str]) -> FundResult<Vec<&'a str>> {
    let mut distinct: Vec<&str> = Vec::with_capacity(ids.len());
    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if !distinct.contains(&id) {
            distinct.push(id);
        }
    }
    if distinct.len() < 2 {
        return Err(FundError::validation(format!(
            "comparison needs at least two funds, got {}",
            distinct.len()
        )));
    }
    Ok(distinct)
}
