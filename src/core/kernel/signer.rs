use crate::core::errors::ExchangeError;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the API key on every authenticated request
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";
pub const TIMESTAMP_PARAM: &str = "timestamp";
pub const SIGNATURE_PARAM: &str = "signature";

/// Ordered key/value parameters. Order is significant: the sequence that is
/// signed is the sequence that is sent.
pub type QueryParams = Vec<(String, String)>;

/// Result type for signing operations
pub type SignatureResult = Result<SignedPayload, ExchangeError>;

/// Everything the dispatcher needs to put an authenticated request on the wire
#[derive(Clone, PartialEq, Eq)]
pub struct SignedPayload {
    /// Headers to attach, in order
    pub headers: Vec<(String, String)>,
    /// Final query string: the canonical signed parameters followed by
    /// `&signature=<hex>`
    pub query_string: String,
    pub timestamp: u64,
    pub signature: String,
}

impl fmt::Debug for SignedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedPayload")
            .field("header_count", &self.headers.len())
            .field("query_string", &self.query_string)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

/// Signer trait for request authentication
///
/// Implementations receive the business parameters in caller order plus the
/// send-time timestamp, and return the exact query string and headers to send.
pub trait Signer: Send + Sync {
    fn sign_request(&self, params: &[(String, String)], timestamp: u64) -> SignatureResult;
}

/// Canonical form-urlencoded serialization, preserving parameter order
pub fn encode_query(params: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Hex HMAC-SHA256 over the canonical serialization of `params`.
///
/// `params` must already hold every field that will be sent except the
/// signature itself.
pub fn sign(params: &[(String, String)], secret: &str) -> Result<String, ExchangeError> {
    if secret.is_empty() {
        return Err(ExchangeError::MissingCredentials);
    }
    hmac_hex(secret, &encode_query(params))
}

fn hmac_hex(secret: &str, payload: &str) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::AuthError(format!("Invalid secret key: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// HMAC-SHA256 signer for the `X-MBX-APIKEY` scheme
pub struct HmacSigner {
    api_key: Secret<String>,
    secret_key: Secret<String>,
}

impl HmacSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner")
            .field("has_credentials", &self.has_credentials())
            .finish_non_exhaustive()
    }
}

impl Signer for HmacSigner {
    fn sign_request(&self, params: &[(String, String)], timestamp: u64) -> SignatureResult {
        if !self.has_credentials() {
            return Err(ExchangeError::MissingCredentials);
        }

        let mut signed_params = Vec::with_capacity(params.len() + 1);
        signed_params.extend_from_slice(params);
        signed_params.push((TIMESTAMP_PARAM.to_string(), timestamp.to_string()));

        // The signature is computed over, and appended to, this exact string.
        let canonical = encode_query(&signed_params);
        let signature = hmac_hex(self.secret_key.expose_secret(), &canonical)?;
        let query_string = format!("{}&{}={}", canonical, SIGNATURE_PARAM, signature);

        Ok(SignedPayload {
            headers: vec![(
                API_KEY_HEADER.to_string(),
                self.api_key.expose_secret().clone(),
            )],
            query_string,
            timestamp,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    // Published reference vector for the exchange's HMAC scheme.
    const DOC_SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

    fn doc_params() -> QueryParams {
        params(&[
            ("symbol", "LTCBTC"),
            ("side", "BUY"),
            ("type", "LIMIT"),
            ("timeInForce", "GTC"),
            ("quantity", "1"),
            ("price", "0.1"),
            ("recvWindow", "5000"),
            ("timestamp", "1499827319559"),
        ])
    }

    #[test]
    fn test_sign_matches_reference_vector() {
        let signature = sign(&doc_params(), DOC_SECRET).unwrap();
        assert_eq!(
            signature,
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let first = sign(&doc_params(), DOC_SECRET).unwrap();
        let second = sign(&doc_params(), DOC_SECRET).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sign_detects_mutations() {
        let base = sign(&doc_params(), DOC_SECRET).unwrap();

        let mut changed_value = doc_params();
        changed_value[4].1 = "2".to_string();
        assert_ne!(base, sign(&changed_value, DOC_SECRET).unwrap());

        let mut reordered = doc_params();
        reordered.swap(0, 1);
        assert_ne!(base, sign(&reordered, DOC_SECRET).unwrap());

        let mut extra = doc_params();
        extra.push(("newOrderRespType".to_string(), "FULL".to_string()));
        assert_ne!(base, sign(&extra, DOC_SECRET).unwrap());

        assert_ne!(base, sign(&doc_params(), "another-secret").unwrap());
    }

    #[test]
    fn test_sign_rejects_empty_secret() {
        assert!(matches!(
            sign(&doc_params(), ""),
            Err(ExchangeError::MissingCredentials)
        ));
    }

    #[test]
    fn test_encode_query_preserves_order_and_escapes() {
        let encoded = encode_query(&params(&[("b", "x y"), ("a", "1&2"), ("c", "é")]));
        assert_eq!(encoded, "b=x+y&a=1%262&c=%C3%A9");
    }

    #[test]
    fn test_signed_payload_appends_timestamp_then_signature() {
        let signer = HmacSigner::new("api-key".to_string(), DOC_SECRET.to_string());
        let payload = signer
            .sign_request(&params(&[("symbol", "LTCBTC")]), 1_499_827_319_559)
            .unwrap();

        assert!(payload
            .query_string
            .starts_with("symbol=LTCBTC&timestamp=1499827319559&signature="));
        assert_eq!(
            payload.headers,
            vec![(API_KEY_HEADER.to_string(), "api-key".to_string())]
        );
    }

    #[test]
    fn test_signature_recomputes_from_sent_query() {
        let signer = HmacSigner::new("api-key".to_string(), DOC_SECRET.to_string());
        let payload = signer
            .sign_request(&params(&[("symbol", "BTCUSDT"), ("note", "a b&c")]), 42)
            .unwrap();

        let (signed_part, sent_signature) = payload
            .query_string
            .rsplit_once("&signature=")
            .expect("signature is the trailing field");

        assert!(!signed_part.contains("signature="));
        assert_eq!(sent_signature, payload.signature);
        assert_eq!(hmac_hex(DOC_SECRET, signed_part).unwrap(), sent_signature);
    }

    #[test]
    fn test_signer_without_credentials_fails() {
        let no_secret = HmacSigner::new("api-key".to_string(), String::new());
        let no_key = HmacSigner::new(String::new(), "secret".to_string());

        assert!(matches!(
            no_secret.sign_request(&[], 1),
            Err(ExchangeError::MissingCredentials)
        ));
        assert!(matches!(
            no_key.sign_request(&[], 1),
            Err(ExchangeError::MissingCredentials)
        ));
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let signer = HmacSigner::new("visible-key".to_string(), "hidden-secret".to_string());
        let rendered = format!("{:?}", signer);
        assert!(!rendered.contains("visible-key"));
        assert!(!rendered.contains("hidden-secret"));
    }
}
