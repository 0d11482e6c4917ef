//! Webhook signature schemes of the identity provider (Svix) and the payment
//! provider (Stripe). Both are HMAC-SHA256 over `"{timestamp}.{raw body}"`
//! style content, checked in constant time.

use axum::http::HeaderMap;
use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Maximum clock skew accepted between the signed timestamp and now.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub const SVIX_ID: &str = "svix-id";
pub const SVIX_TIMESTAMP: &str = "svix-timestamp";
pub const SVIX_SIGNATURE: &str = "svix-signature";
pub const STRIPE_SIGNATURE: &str = "stripe-signature";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Missing Svix headers")]
    MissingHeaders,
    #[error("Missing stripe-signature header")]
    MissingSignature,
    #[error("signing secret is not valid")]
    InvalidSecret,
    #[error("signature header is malformed")]
    MalformedHeader,
    #[error("timestamp outside of the tolerance zone")]
    TimestampOutOfTolerance,
    #[error("no matching signature found")]
    NoMatchingSignature,
}

#[derive(Debug, Clone, Copy)]
pub struct SvixHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

impl<'a> SvixHeaders<'a> {
    /// All three headers must be present and readable.
    pub fn from_headers(headers: &'a HeaderMap) -> Result<Self, SignatureError> {
        let get = move |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .ok_or(SignatureError::MissingHeaders)
        };
        Ok(Self {
            id: get(SVIX_ID)?,
            timestamp: get(SVIX_TIMESTAMP)?,
            signature: get(SVIX_SIGNATURE)?,
        })
    }
}

fn svix_key(secret: &str) -> Result<Vec<u8>, SignatureError> {
    let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
    BASE64_STANDARD
        .decode(encoded)
        .map_err(|_| SignatureError::InvalidSecret)
}

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SignatureError::InvalidSecret)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

fn check_tolerance(timestamp: i64, now: i64) -> Result<(), SignatureError> {
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::TimestampOutOfTolerance);
    }
    Ok(())
}

fn ct_eq(a: &str, b: &str) -> bool {
    ConstantTimeEq::ct_eq(a.as_bytes(), b.as_bytes()).into()
}

/// Base64 signature for `"{msg_id}.{timestamp}.{body}"`.
pub fn sign_svix(
    secret: &str,
    msg_id: &str,
    timestamp: i64,
    body: &[u8],
) -> Result<String, SignatureError> {
    let key = svix_key(secret)?;
    let ts = timestamp.to_string();
    let digest = hmac_sha256(
        &key,
        &[msg_id.as_bytes(), b".", ts.as_bytes(), b".", body],
    )?;
    Ok(BASE64_STANDARD.encode(digest))
}

pub fn verify_svix(
    secret: &str,
    headers: &SvixHeaders<'_>,
    body: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    let timestamp: i64 = headers
        .timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::MalformedHeader)?;
    check_tolerance(timestamp, now)?;

    let expected = sign_svix(secret, headers.id, timestamp, body)?;

    // "v1,<sig> v1,<sig2>": any listed v1 signature may match.
    let matched = headers
        .signature
        .split_whitespace()
        .filter_map(|entry| entry.split_once(','))
        .filter(|(version, _)| *version == "v1")
        .any(|(_, sig)| ct_eq(sig, &expected));

    if matched {
        Ok(())
    } else {
        Err(SignatureError::NoMatchingSignature)
    }
}

/// Hex signature for `"{timestamp}.{body}"`.
pub fn sign_stripe(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, SignatureError> {
    let ts = timestamp.to_string();
    let digest = hmac_sha256(secret.as_bytes(), &[ts.as_bytes(), b".", body])?;
    Ok(hex::encode(digest))
}

pub fn stripe_signature_header(
    secret: &str,
    timestamp: i64,
    body: &[u8],
) -> Result<String, SignatureError> {
    Ok(format!("t={},v1={}", timestamp, sign_stripe(secret, timestamp, body)?))
}

pub fn verify_stripe(
    secret: &str,
    header: &str,
    body: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    if header.trim().is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for item in header.split(',') {
        let Some((key, value)) = item.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(SignatureError::NoMatchingSignature);
    }
    check_tolerance(timestamp, now)?;

    let expected = sign_stripe(secret, timestamp, body)?;
    if signatures.iter().any(|sig| ct_eq(sig, &expected)) {
        Ok(())
    } else {
        Err(SignatureError::NoMatchingSignature)
    }
}
