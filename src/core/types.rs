use crate::core::config::MAX_RECV_WINDOW;
use crate::core::errors::ExchangeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest page the order history endpoint will return
pub const MAX_ORDER_HISTORY_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    #[default]
    GTC, // Good Till Canceled
    IOC, // Immediate or Cancel
    FOK, // Fill or Kill
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GTC => "GTC",
            Self::IOC => "IOC",
            Self::FOK => "FOK",
        }
    }
}

/// Lifecycle state of an order as reported by the exchange.
///
/// Statuses this crate does not model (e.g. `PENDING_CANCEL`) are kept in
/// `Other` and treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "NEW",
            Self::PartiallyFilled => "PARTIALLY_FILLED",
            Self::Filled => "FILLED",
            Self::Canceled => "CANCELED",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
            Self::Other(raw) => raw,
        }
    }

    /// No further transition is expected once an order reaches one of these.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Rejected | Self::Expired
        )
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "NEW" => Self::New,
            "PARTIALLY_FILLED" => Self::PartiallyFilled,
            "FILLED" => Self::Filled,
            "CANCELED" => Self::Canceled,
            "REJECTED" => Self::Rejected,
            "EXPIRED" => Self::Expired,
            _ => Self::Other(raw),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a previously placed order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderReference {
    pub symbol: String,
    pub order_id: i64,
}

impl OrderReference {
    pub fn new(symbol: impl Into<String>, order_id: i64) -> Self {
        Self {
            symbol: symbol.into(),
            order_id,
        }
    }

    pub fn validate(&self) -> Result<(), ExchangeError> {
        validate_symbol(&self.symbol)?;
        if self.order_id == 0 {
            return Err(ExchangeError::InvalidParameters(
                "order id must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.symbol, self.order_id)
    }
}

/// Point-in-time view of an order, fetched fresh on each poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusSnapshot {
    pub order_id: i64,
    pub symbol: String,
    pub status: OrderStatus,
    pub executed_quantity: Decimal,
    pub price: Decimal,
}

/// Normalized fill of a single order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillRecord {
    pub symbol: String,
    pub order_id: i64,
    pub price: Decimal,
    pub quantity: Decimal,
    /// Set only by the explicit test-order simulation. A fill coming back
    /// from the live order book is never simulated.
    pub simulated: bool,
}

impl FillRecord {
    pub fn from_snapshot(snapshot: &OrderStatusSnapshot) -> Self {
        Self {
            symbol: snapshot.symbol.clone(),
            order_id: snapshot.order_id,
            price: snapshot.price,
            quantity: snapshot.executed_quantity,
            simulated: false,
        }
    }

    /// Every fill record describes an order that can no longer change.
    pub const fn is_terminal(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentOutcome {
    /// The order reached FILLED.
    Filled(FillRecord),
    /// The order reached CANCELED, REJECTED or EXPIRED without filling.
    /// `executed_quantity` carries any partial fill to reconcile.
    Closed {
        symbol: String,
        order_id: i64,
        status: OrderStatus,
        executed_quantity: Decimal,
        attempts_made: u32,
    },
}

impl FulfillmentOutcome {
    pub fn fill(&self) -> Option<&FillRecord> {
        match self {
            Self::Filled(fill) => Some(fill),
            Self::Closed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl Balance {
    pub fn is_empty(&self) -> bool {
        self.free.is_zero() && self.locked.is_zero()
    }
}

/// Limit order arguments, validated before anything is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub time_in_force: TimeInForce,
}

impl LimitOrder {
    pub fn new(symbol: impl Into<String>, side: OrderSide, quantity: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            price,
            time_in_force: TimeInForce::GTC,
        }
    }

    #[must_use]
    pub fn time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = time_in_force;
        self
    }

    pub fn validate(&self) -> Result<(), ExchangeError> {
        validate_symbol(&self.symbol)?;
        validate_positive("quantity", self.quantity)?;
        validate_positive("price", self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
}

impl MarketOrder {
    pub fn new(symbol: impl Into<String>, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
        }
    }

    pub fn validate(&self) -> Result<(), ExchangeError> {
        validate_symbol(&self.symbol)?;
        validate_positive("quantity", self.quantity)
    }
}

/// Order history query. `order_id` starts the page at that order when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllOrdersQuery {
    pub symbol: String,
    pub limit: u32,
    pub order_id: Option<i64>,
}

impl AllOrdersQuery {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            limit: 500,
            order_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ExchangeError> {
        validate_symbol(&self.symbol)?;
        if self.limit == 0 || self.limit > MAX_ORDER_HISTORY_LIMIT {
            return Err(ExchangeError::InvalidParameters(format!(
                "limit must be within 1..={}, got {}",
                MAX_ORDER_HISTORY_LIMIT, self.limit
            )));
        }
        if self.order_id == Some(0) {
            return Err(ExchangeError::InvalidParameters(
                "order id must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn validate_symbol(symbol: &str) -> Result<(), ExchangeError> {
    if symbol.trim().is_empty() {
        return Err(ExchangeError::InvalidParameters(
            "symbol must not be empty".to_string(),
        ));
    }
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ExchangeError::InvalidParameters(format!(
            "symbol must be alphanumeric, got {:?}",
            symbol
        )));
    }
    Ok(())
}

pub fn validate_positive(field: &str, value: Decimal) -> Result<(), ExchangeError> {
    if value <= Decimal::ZERO {
        return Err(ExchangeError::InvalidParameters(format!(
            "{} must be positive, got {}",
            field, value
        )));
    }
    Ok(())
}

pub fn validate_recv_window(recv_window: u64) -> Result<(), ExchangeError> {
    if recv_window == 0 || recv_window > MAX_RECV_WINDOW {
        return Err(ExchangeError::InvalidParameters(format!(
            "recvWindow must be within 1..={} ms, got {}",
            MAX_RECV_WINDOW, recv_window
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_order_status_round_trips_unknown_values() {
        let status: OrderStatus = serde_json::from_str("\"PENDING_CANCEL\"").unwrap();
        assert_eq!(status, OrderStatus::Other("PENDING_CANCEL".to_string()));
        assert!(!status.is_terminal());
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"PENDING_CANCEL\"");
    }

    #[test]
    fn test_terminal_statuses() {
        for raw in ["FILLED", "CANCELED", "REJECTED", "EXPIRED"] {
            assert!(OrderStatus::from(raw.to_string()).is_terminal(), "{raw}");
        }
        for raw in ["NEW", "PARTIALLY_FILLED"] {
            assert!(!OrderStatus::from(raw.to_string()).is_terminal(), "{raw}");
        }
    }

    #[test]
    fn test_order_reference_validation() {
        assert!(OrderReference::new("BTCUSDT", 42).validate().is_ok());
        assert!(matches!(
            OrderReference::new("", 42).validate(),
            Err(ExchangeError::InvalidParameters(_))
        ));
        assert!(matches!(
            OrderReference::new("BTCUSDT", 0).validate(),
            Err(ExchangeError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_limit_order_validation() {
        let qty = Decimal::from_str("0.5").unwrap();
        let price = Decimal::from_str("30000").unwrap();

        assert!(LimitOrder::new("BTCUSDT", OrderSide::Buy, qty, price)
            .validate()
            .is_ok());
        assert!(LimitOrder::new("BTCUSDT", OrderSide::Buy, Decimal::ZERO, price)
            .validate()
            .is_err());
        assert!(LimitOrder::new("BTCUSDT", OrderSide::Sell, qty, -price)
            .validate()
            .is_err());
        assert!(LimitOrder::new("BTC USDT", OrderSide::Sell, qty, price)
            .validate()
            .is_err());
    }

    #[test]
    fn test_all_orders_query_limit_bounds() {
        let mut query = AllOrdersQuery::new("ETHBTC");
        assert!(query.validate().is_ok());

        query.limit = 0;
        assert!(query.validate().is_err());

        query.limit = MAX_ORDER_HISTORY_LIMIT + 1;
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_recv_window_validation() {
        assert!(validate_recv_window(5000).is_ok());
        assert!(validate_recv_window(0).is_err());
        assert!(validate_recv_window(60_001).is_err());
    }
}
