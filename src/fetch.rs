use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::{Customer, PaymentIntent};

const API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("lookup returned status {0}")]
    NotFound(StatusCode),
    #[error("undecodable response body: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

/// Retrieve a Stripe customer object by its id.
pub async fn customer(api_key: &str, id: &str) -> Result<Customer, FetchError> {
    retrieve(api_key, "customers", id).await
}

/// Retrieve a Stripe payment intent by its id.
pub async fn payment_intent(api_key: &str, id: &str) -> Result<PaymentIntent, FetchError> {
    retrieve(api_key, "payment_intents", id).await
}

/// One authenticated lookup against the Stripe API. No retries and no
/// caching; each record the pipeline needs costs exactly one GET.
async fn retrieve<T: DeserializeOwned>(
    api_key: &str,
    path: &str,
    id: &str,
) -> Result<T, FetchError> {
    let url = format!("{}/{}/{}", API_BASE, path, id);
    info!("Retrieving {}", url);
    let client = reqwest::Client::new();
    let response = client
        .get(&url)
        .basic_auth(api_key, None::<&str>)
        .send()
        .await?;

    if response.status() != StatusCode::OK {
        return Err(FetchError::NotFound(response.status()));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
