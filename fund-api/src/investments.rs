//! Investment order endpoints
//!
//! Requests are validated locally before anything is sent, and a validation
//! failure is always returned to the caller, never papered over with demo
//! data. Orders created while the backend is unreachable are kept in an
//! in-memory demo book so that confirming and listing them behaves
//! consistently.

use std::sync::Arc;

use fund_core::{FundError, FundResult, InvestmentOrder, InvestmentRequest, OrderStatus};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, instrument};

use crate::demo;
use crate::fetched::{or_demo, Fetched};
use crate::http::ApiClient;

#[derive(Serialize)]
struct ConfirmRequest<'a> {
    payment_reference: &'a str,
}

/// Client for `/investments`
#[derive(Debug, Clone)]
pub struct InvestmentApi {
    http: ApiClient,
    demo_orders: Arc<Mutex<Vec<InvestmentOrder>>>,
}

impl InvestmentApi {
    pub fn new(http: ApiClient) -> Self {
        Self {
            http,
            demo_orders: Arc::new(Mutex::new(demo::orders())),
        }
    }

    /// Place an order
    #[instrument(skip(self))]
    pub async fn initiate(&self, request: &InvestmentRequest) -> FundResult<InvestmentOrder> {
        request.validate()?;
        let order: InvestmentOrder = self.http.post(&["investments"], request).await?;
        info!(
            "[FundApi] Order {} created for {} ({})",
            order.order_id, order.fund_id, order.amount
        );
        Ok(order)
    }

    /// Like [`initiate`](Self::initiate), recording a demo order when the backend fails
    ///
    /// Demo orders are checked against the catalogue minimums when the fund
    /// is known there.
    pub async fn initiate_or_demo(
        &self,
        request: &InvestmentRequest,
    ) -> FundResult<Fetched<InvestmentOrder>> {
        request.validate()?;
        match self.initiate(request).await {
            Ok(order) => Ok(Fetched::live(order)),
            Err(e) => {
                if let Some(fund) = demo::fund(&request.fund_id) {
                    request.validate_for(&fund)?;
                }
                let order = demo::new_order(request);
                self.demo_orders.lock().push(order.clone());
                Ok(or_demo(Err(e), "initiate", || order))
            }
        }
    }

    /// Confirm payment for a pending order
    #[instrument(skip(self))]
    pub async fn confirm(
        &self,
        order_id: &str,
        payment_reference: &str,
    ) -> FundResult<InvestmentOrder> {
        let (order_id, payment_reference) = confirm_args(order_id, payment_reference)?;
        self.http
            .post(
                &["investments", order_id, "confirm"],
                &ConfirmRequest { payment_reference },
            )
            .await
    }

    /// Confirms in the demo book when the backend fails; unknown ids keep the live error
    pub async fn confirm_or_demo(
        &self,
        order_id: &str,
        payment_reference: &str,
    ) -> FundResult<Fetched<InvestmentOrder>> {
        let (order_id, _) = confirm_args(order_id, payment_reference)?;
        match self.confirm(order_id, payment_reference).await {
            Ok(order) => Ok(Fetched::live(order)),
            Err(e) => {
                let confirmed = {
                    let mut book = self.demo_orders.lock();
                    book.iter_mut().find(|o| o.order_id == order_id).map(|order| {
                        if !order.status.is_final() {
                            order.status = OrderStatus::Confirmed;
                        }
                        order.clone()
                    })
                };
                match confirmed {
                    Some(order) => Ok(or_demo(Err(e), "confirm", || order)),
                    None => Err(e),
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> FundResult<Vec<InvestmentOrder>> {
        self.http.get(&["investments"], &[]).await
    }

    /// Newest first when served from the demo book
    pub async fn list_orders_or_demo(&self) -> Fetched<Vec<InvestmentOrder>> {
        or_demo(self.list_orders().await, "list_orders", || {
            let mut orders = self.demo_orders.lock().clone();
            orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            orders
        })
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: &str) -> FundResult<InvestmentOrder> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(FundError::validation("order id is required"));
        }
        self.http.get(&["investments", order_id], &[]).await
    }

    pub async fn get_order_or_demo(&self, order_id: &str) -> FundResult<Fetched<InvestmentOrder>> {
        match self.get_order(order_id).await {
            Ok(order) => Ok(Fetched::live(order)),
            Err(e) if e.is_validation() => Err(e),
            Err(e) => {
                let found = self
                    .demo_orders
                    .lock()
                    .iter()
                    .find(|o| o.order_id == order_id.trim())
                    .cloned();
                match found {
                    Some(order) => Ok(or_demo(Err(e), "get_order", || order)),
                    None => Err(e),
                }
            }
        }
    }
}

fn confirm_args<'a>(order_id: &'a str, payment_reference: &'a str) -> FundResult<(&'a str, &'a str)> {
    let order_id = order_id.trim();
    let payment_reference = payment_reference.trim();
    if order_id.is_empty() {
        return Err(FundError::validation("order id is required"));
    }
    if payment_reference.is_empty() {
        return Err(FundError::validation("payment reference is required"));
    }
    Ok((order_id, payment_reference))
}
