//! Paper execution gateway.
//!
//! In-memory gateway for demo runs and tests: accepts every order unless a
//! failure reason is armed, records submissions, and serves a configurable
//! balance.

use super::{ExecutionGateway, GatewayError, MarketOrderRequest, OrderAck};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Gateway that simulates execution locally.
pub struct PaperGateway {
    balance: Mutex<f64>,
    submitted: Mutex<Vec<MarketOrderRequest>>,
    fail_with: Mutex<Option<String>>,
    connected: AtomicBool,
    next_order_id: AtomicU64,
}

impl PaperGateway {
    /// Create a paper gateway with a starting balance.
    pub fn new(balance: f64) -> Self {
        Self {
            balance: Mutex::new(balance),
            submitted: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
            connected: AtomicBool::new(true),
            next_order_id: AtomicU64::new(1),
        }
    }

    /// Set the balance reported to callers.
    pub fn set_balance(&self, balance: f64) {
        *self.balance.lock().unwrap() = balance;
    }

    /// Arm a rejection: subsequent submissions fail with this reason.
    pub fn fail_next_with(&self, reason: &str) {
        *self.fail_with.lock().unwrap() = Some(reason.to_string());
    }

    /// Clear an armed rejection.
    pub fn clear_failure(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    /// Simulate the gateway going offline.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Orders submitted so far, in order.
    pub fn submitted_orders(&self) -> Vec<MarketOrderRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutionGateway for PaperGateway {
    async fn submit_market_order(
        &self,
        order: &MarketOrderRequest,
    ) -> Result<OrderAck, GatewayError> {
        if let Some(reason) = self.fail_with.lock().unwrap().clone() {
            return Err(GatewayError::Rejected(reason));
        }

        self.submitted.lock().unwrap().push(order.clone());
        let id = self.next_order_id.fetch_add(1, Ordering::Relaxed);
        Ok(OrderAck {
            order_id: Some(format!("paper-{}", id)),
        })
    }

    async fn withdrawable_balance(&self) -> Result<f64, GatewayError> {
        Ok(*self.balance.lock().unwrap())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}
