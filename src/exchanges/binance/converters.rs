use super::types as binance_types;
use crate::core::errors::ExchangeError;
use crate::core::types::{Balance, FillRecord, MarketOrder, OrderStatusSnapshot};
use rust_decimal::Decimal;

/// Markup applied to the reference price of a simulated market fill. Market
/// orders rarely execute at the quoted ticker.
pub const SIMULATED_SLIPPAGE: Decimal = Decimal::from_parts(1025, 0, 0, false, 3);

/// Convert binance balance to core balance type
pub fn convert_binance_balance(balance: binance_types::BinanceBalance) -> Balance {
    Balance {
        asset: balance.asset,
        free: balance.free,
        locked: balance.locked,
    }
}

pub fn convert_binance_order(order: binance_types::BinanceOrder) -> OrderStatusSnapshot {
    OrderStatusSnapshot {
        order_id: order.order_id,
        symbol: order.symbol,
        status: order.status,
        executed_quantity: order.executed_qty,
        price: order.price,
    }
}

/// One record per reported fill. An ACK-style response without a fill list
/// but with executed quantity collapses into a single record at the average
/// price.
pub fn convert_order_fills(response: &binance_types::BinanceOrderResponse) -> Vec<FillRecord> {
    if !response.fills.is_empty() {
        return response
            .fills
            .iter()
            .map(|fill| FillRecord {
                symbol: response.symbol.clone(),
                order_id: response.order_id,
                price: fill.price,
                quantity: fill.qty,
                simulated: false,
            })
            .collect();
    }

    if response.executed_qty.is_zero() {
        return Vec::new();
    }

    let price = response
        .cummulative_quote_qty
        .checked_div(response.executed_qty)
        .unwrap_or(response.price);
    vec![FillRecord {
        symbol: response.symbol.clone(),
        order_id: response.order_id,
        price,
        quantity: response.executed_qty,
        simulated: false,
    }]
}

/// Fabricated fill for a test order. No exchange order exists, so the
/// record carries order id 0.
pub fn simulated_market_fill(
    order: &MarketOrder,
    reference_price: Decimal,
) -> Result<FillRecord, ExchangeError> {
    let price = reference_price
        .checked_mul(SIMULATED_SLIPPAGE)
        .ok_or_else(|| {
            ExchangeError::InvalidParameters(format!(
                "reference price {} is out of range for a simulated fill",
                reference_price
            ))
        })?;

    Ok(FillRecord {
        symbol: order.symbol.clone(),
        order_id: 0,
        price,
        quantity: order.quantity,
        simulated: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::OrderSide;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_slippage_constant() {
        assert_eq!(SIMULATED_SLIPPAGE, dec("1.025"));
    }

    #[test]
    fn test_simulated_fill_is_labeled() {
        let order = MarketOrder::new("BNBBTC", OrderSide::Buy, dec("2"));
        let fill = simulated_market_fill(&order, dec("0.001")).unwrap();

        assert!(fill.simulated);
        assert_eq!(fill.price, dec("0.001025"));
        assert_eq!(fill.quantity, dec("2"));
    }

    #[test]
    fn test_simulated_fill_rejects_overflowing_price() {
        let order = MarketOrder::new("BTCUSDT", OrderSide::Buy, Decimal::ONE);
        let result = simulated_market_fill(&order, Decimal::MAX);

        assert!(matches!(result, Err(ExchangeError::InvalidParameters(_))));
    }

    #[test]
    fn test_ack_response_collapses_to_average_price() {
        let response: binance_types::BinanceOrderResponse = serde_json::from_str(
            r#"{"symbol":"ETHUSDT","orderId":9,"executedQty":"2","cummulativeQuoteQty":"3001","price":"0"}"#,
        )
        .unwrap();

        let fills = convert_order_fills(&response);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, dec("1500.5"));
        assert!(!fills[0].simulated);
    }

    #[test]
    fn test_unfilled_response_has_no_fills() {
        let response: binance_types::BinanceOrderResponse =
            serde_json::from_str(r#"{"symbol":"ETHUSDT","orderId":9}"#).unwrap();
        assert!(convert_order_fills(&response).is_empty());
    }
}
