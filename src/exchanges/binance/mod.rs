pub mod connector;
pub mod converters;
pub mod rest;
pub mod types;

use crate::core::audit::AuditSink;
use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{HmacSigner, ReqwestRest, RestClientBuilder, RestClientConfig};
use std::sync::Arc;

// Re-export main types for easier importing
pub use connector::BinanceConnector;
pub use rest::BinanceRestClient;
pub use types::{
    BinanceAccountInfo, BinanceBalance, BinanceCanceledOrder, BinanceDeposit, BinanceFill,
    BinanceOrder, BinanceOrderResponse, BinanceTrade, BinanceWithdraw,
};

/// Create a Binance connector over reqwest
pub fn create_binance_connector(
    config: ExchangeConfig,
) -> Result<BinanceConnector<ReqwestRest>, ExchangeError> {
    build_connector(config, None)
}

/// Create a Binance connector that records every round trip to `sink`
pub fn create_binance_connector_with_audit(
    config: ExchangeConfig,
    sink: Arc<dyn AuditSink>,
) -> Result<BinanceConnector<ReqwestRest>, ExchangeError> {
    build_connector(config, Some(sink))
}

fn build_connector(
    config: ExchangeConfig,
    sink: Option<Arc<dyn AuditSink>>,
) -> Result<BinanceConnector<ReqwestRest>, ExchangeError> {
    config.validate()?;

    let rest_config = RestClientConfig::new(config.resolved_base_url(), "binance".to_string());

    // The signer is attached even without credentials so that signed calls
    // fail with MissingCredentials instead of going out unsigned.
    let signer = Arc::new(HmacSigner::new(
        config.api_key().to_string(),
        config.secret_key().to_string(),
    ));
    let mut rest_builder = RestClientBuilder::new(rest_config).with_signer(signer);

    if let Some(sink) = sink {
        rest_builder = rest_builder.with_audit_sink(sink);
    }

    let rest = rest_builder.build()?;
    Ok(BinanceConnector::new(rest, config))
}
