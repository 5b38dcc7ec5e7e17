use mbx_trade::core::config::ExchangeConfig;
use mbx_trade::{create_binance_connector, AccountInfo};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Reads BINANCE_API_KEY / BINANCE_SECRET_KEY, from .env when present.
    // Falls back to an unauthenticated testnet client so the demo still runs.
    let config = ExchangeConfig::from_env_auto("BINANCE")
        .unwrap_or_else(|_| ExchangeConfig::read_only().testnet(true));

    let binance = create_binance_connector(config)?;

    if !binance.can_authenticate() {
        info!("no credentials configured, signed calls will be refused locally");
    }

    match binance.get_positions().await {
        Ok(positions) => {
            println!("Found {} non-empty balances", positions.len());
            for balance in &positions {
                println!(
                    "{}: free {}, locked {}",
                    balance.asset, balance.free, balance.locked
                );
            }
        }
        Err(e) => {
            error!(error = %e, "failed to fetch positions");
        }
    }

    // Example synchronous order (commented out for safety)
    /*
    let order = LimitOrder::new("BTCUSDT", OrderSide::Buy, dec!(0.001), dec!(30000));
    match binance.place_limit_order_and_wait(order).await {
        Ok(outcome) => println!("Order finished: {:?}", outcome),
        Err(e) => println!("Order did not fill: {}", e),
    }
    */

    Ok(())
}
