/// Transport kernel: request signing and the signed-execute primitive.
///
/// The kernel knows nothing about orders or balances. It turns a
/// [`RequestSpec`] into an HTTP round trip and hands back a typed result or a
/// classified [`ExchangeError`](crate::core::errors::ExchangeError).
///
/// # Components
///
/// - `Signer` / `HmacSigner`: canonical query string + HMAC-SHA256 signature
/// - `RestClient` / `ReqwestRest`: builds, signs, sends, audits and decodes
///
/// # Usage
///
/// ```rust,no_run
/// use mbx_trade::core::kernel::*;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), mbx_trade::ExchangeError> {
/// let rest = RestClientBuilder::new(RestClientConfig::new(
///     "https://api.binance.com".to_string(),
///     "binance".to_string(),
/// ))
/// .with_signer(Arc::new(HmacSigner::new(
///     "api_key".to_string(),
///     "secret_key".to_string(),
/// )))
/// .build()?;
///
/// let account: serde_json::Value = rest
///     .execute(RequestSpec::get("/api/v3/account").signed())
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// # Invariants
///
/// 1. Parameters keep caller order from `RequestSpec` to the wire.
/// 2. The signed string and the sent string are the same bytes; only
///    `&signature=<hex>` is appended after signing.
/// 3. The timestamp is taken inside `execute`, right before sending.
/// 4. A private call without credentials never reaches the network.
pub mod rest;
pub mod signer;

pub use rest::{
    PreparedRequest, RequestSpec, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig,
};
pub use signer::{
    encode_query, sign, HmacSigner, QueryParams, SignatureResult, SignedPayload, Signer,
    API_KEY_HEADER,
};
