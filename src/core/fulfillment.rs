//! Synchronous "place and wait" on top of an asynchronous order endpoint.
//!
//! Order acceptance does not imply execution, so after placement the waiter
//! polls the order until it reaches a terminal status or the attempt budget
//! runs out. On timeout it cancels the order so nothing is left open without
//! an explicit decision by the caller.
//!
//! ```text
//!   Polling ──FILLED──────────────────────────────▶ Filled
//!      │  ──CANCELED/REJECTED/EXPIRED─────────────▶ Filled (Closed outcome)
//!      │  ──poll error────────────────────────────▶ Error
//!      │  ──budget exhausted / aborted──▶ TimedOutCanceling
//!      ▼                                     │ cancel ok ──▶ TimedOutCanceled
//!   (sleep, poll again)                      │ cancel err ─▶ Error (CancelFailed)
//! ```

use crate::core::errors::ExchangeError;
use crate::core::traits::OrderTracker;
use crate::core::types::{
    FillRecord, FulfillmentOutcome, OrderReference, OrderStatus, OrderStatusSnapshot,
};
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 300;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Fixed-interval polling budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, poll_interval: Duration) -> Self {
        Self {
            max_attempts,
            poll_interval,
        }
    }

    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.max_attempts == 0 {
            return Err(ExchangeError::InvalidParameters(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Pauses between consecutive polls: one fewer than the number of polls.
    fn delays(&self) -> impl Iterator<Item = Duration> {
        FixedInterval::new(self.poll_interval).take(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// Polls one order to completion. Each waiter owns its own attempt counter,
/// so independent waiters need no coordination.
pub struct FulfillmentWaiter<'a, T: OrderTracker + ?Sized> {
    tracker: &'a T,
    policy: RetryPolicy,
    abort: Option<CancellationToken>,
}

impl<'a, T: OrderTracker + ?Sized> FulfillmentWaiter<'a, T> {
    pub fn new(tracker: &'a T, policy: RetryPolicy) -> Self {
        Self {
            tracker,
            policy,
            abort: None,
        }
    }

    /// Stop polling early when `token` is cancelled. The order is then
    /// canceled exactly as on timeout.
    #[must_use]
    pub fn with_abort_token(mut self, token: CancellationToken) -> Self {
        self.abort = Some(token);
        self
    }

    /// Poll `order` until it reaches a terminal status.
    ///
    /// * `Ok(Filled)` when the order fills
    /// * `Ok(Closed)` when the exchange closes it unfilled (partial fills included)
    /// * `Err(FulfillmentTimeout)` when the budget ran out and the order was canceled
    /// * `Err(CancelFailed)` when the budget ran out and canceling also failed;
    ///   the order may still be live
    /// * any poll error, unchanged
    #[instrument(skip(self, order), fields(order = %order, max_attempts = self.policy.max_attempts))]
    pub async fn await_fulfillment(
        &self,
        order: &OrderReference,
    ) -> Result<FulfillmentOutcome, ExchangeError> {
        order.validate()?;
        self.policy.validate()?;

        let mut delays = self.policy.delays();
        let mut attempts_made = 0u32;

        loop {
            let Some(polled) = self.poll(order).await else {
                warn!(attempts_made, "fulfillment aborted by caller");
                break;
            };
            let snapshot = polled?;
            attempts_made += 1;

            debug!(
                attempt = attempts_made,
                status = %snapshot.status,
                executed_quantity = %snapshot.executed_quantity,
                "polled order status"
            );

            match snapshot.status {
                OrderStatus::Filled => {
                    return Ok(FulfillmentOutcome::Filled(FillRecord::from_snapshot(
                        &snapshot,
                    )));
                }
                ref status if status.is_terminal() => {
                    return Ok(FulfillmentOutcome::Closed {
                        symbol: snapshot.symbol,
                        order_id: snapshot.order_id,
                        status: status.clone(),
                        executed_quantity: snapshot.executed_quantity,
                        attempts_made,
                    });
                }
                _ => {}
            }

            let Some(delay) = delays.next() else {
                break;
            };
            if !self.pause(delay).await {
                warn!(attempts_made, "fulfillment aborted by caller");
                break;
            }
        }

        self.cancel_unfilled(order, attempts_made).await
    }

    /// `None` when the abort token fired before the poll completed
    async fn poll(
        &self,
        order: &OrderReference,
    ) -> Option<Result<OrderStatusSnapshot, ExchangeError>> {
        match &self.abort {
            Some(token) => {
                if token.is_cancelled() {
                    return None;
                }
                tokio::select! {
                    () = token.cancelled() => None,
                    polled = self.tracker.query_order(order) => Some(polled),
                }
            }
            None => Some(self.tracker.query_order(order).await),
        }
    }

    /// `false` when the abort token fired during the pause
    async fn pause(&self, delay: Duration) -> bool {
        match &self.abort {
            Some(token) => tokio::select! {
                () = token.cancelled() => false,
                () = tokio::time::sleep(delay) => true,
            },
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }

    async fn cancel_unfilled(
        &self,
        order: &OrderReference,
        attempts_made: u32,
    ) -> Result<FulfillmentOutcome, ExchangeError> {
        warn!(attempts_made, "order not filled in time, canceling");

        match self.tracker.cancel_order(order).await {
            Ok(executed_quantity) => Err(ExchangeError::FulfillmentTimeout {
                symbol: order.symbol.clone(),
                order_id: order.order_id,
                attempts_made,
                canceled: true,
                executed_quantity,
            }),
            Err(source) => {
                error!(error = %source, "cancel after timeout failed, order state unknown");
                Err(ExchangeError::CancelFailed {
                    symbol: order.symbol.clone(),
                    order_id: order.order_id,
                    attempts_made,
                    source: Box::new(source),
                })
            }
        }
    }
}
