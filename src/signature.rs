use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::model::{CheckoutSession, Event};

/// The one event kind this pipeline understands, as configured for the
/// webhook endpoint in the Stripe dashboard.
pub const EXPECTED_EVENT: &str = "checkout.session.completed";

const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum age of the signed timestamp, matching Stripe's own default.
const TOLERANCE_SECONDS: i64 = 300;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("missing stripe-signature header")]
    MissingSignature,
    #[error("signature verification failed: {0}")]
    Verification(String),
    #[error("unexpected event type: {0}")]
    UnexpectedEventKind(String),
    #[error("malformed event payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// Check that the payload really came from Stripe and pull the completed
/// checkout session out of it.
pub fn checkout_session(
    headers: &HeaderMap,
    payload: &[u8],
    secret: &str,
) -> Result<CheckoutSession, SignatureError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .ok_or(SignatureError::MissingSignature)?
        .to_str()
        .map_err(|e| SignatureError::Verification(format!("unreadable header: {}", e)))?;

    verify(payload, signature, secret, TOLERANCE_SECONDS)?;

    let event: Event = serde_json::from_slice(payload)?;
    if event.event_type != EXPECTED_EVENT {
        return Err(SignatureError::UnexpectedEventKind(event.event_type));
    }
    let session = serde_json::from_value(event.data.object)?;
    Ok(session)
}

/// Verify a `t=...,v1=...` signature header against the payload: the token
/// is the hex HMAC-SHA256 of `"{timestamp}.{payload}"` under the shared
/// secret, and the timestamp must fall within the tolerance window.
pub fn verify(
    payload: &[u8],
    signature: &str,
    secret: &str,
    tolerance_seconds: i64,
) -> Result<(), SignatureError> {
    let (timestamp, candidates) = parse_signature_header(signature)?;

    let signed_at: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::Verification(format!("bad timestamp: {}", timestamp)))?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();
    if (now - signed_at).abs() > tolerance_seconds {
        return Err(SignatureError::Verification(format!(
            "timestamp {} outside tolerance of {}s",
            signed_at, tolerance_seconds
        )));
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| SignatureError::Verification(format!("hmac init: {}", e)))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    if candidates
        .iter()
        .any(|candidate| constant_time_eq(expected.as_bytes(), candidate.as_bytes()))
    {
        Ok(())
    } else {
        Err(SignatureError::Verification("no matching v1 signature".into()))
    }
}

fn parse_signature_header(header: &str) -> Result<(&str, Vec<&str>), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }
    let timestamp = timestamp
        .ok_or_else(|| SignatureError::Verification("no timestamp in signature header".into()))?;
    if candidates.is_empty() {
        return Err(SignatureError::Verification("no v1 signature in header".into()));
    }
    Ok((timestamp, candidates))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
