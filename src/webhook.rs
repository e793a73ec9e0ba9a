use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::config::Config;
use crate::{compose, dispatch, fetch, signature};

/// Fixed outcome strings surfaced in the Stripe dashboard's event log. The
/// response status is always 200 so Stripe does not retry delivery; the
/// acknowledgment text is the only visible failure signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgment {
    Ok,
    NoCheckoutSession,
    UnspecifiedCustomer,
    NoCustomer,
    UnspecifiedPaymentIntent,
    NoPaymentIntent,
    NotComposed,
    NotSent,
}

impl Acknowledgment {
    pub fn as_str(self) -> &'static str {
        match self {
            Acknowledgment::Ok => "ok",
            Acknowledgment::NoCheckoutSession => "couldn't retrieve checkout session",
            Acknowledgment::UnspecifiedCustomer => "unspecified customer",
            Acknowledgment::NoCustomer => "couldn't retrieve customer",
            Acknowledgment::UnspecifiedPaymentIntent => "unspecified payment intent",
            Acknowledgment::NoPaymentIntent => "couldn't retrieve payment intent",
            Acknowledgment::NotComposed => "couldn't compose email",
            Acknowledgment::NotSent => "couldn't send email",
        }
    }
}

impl IntoResponse for Acknowledgment {
    fn into_response(self) -> Response {
        (
            http::StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html")],
            self.as_str(),
        )
            .into_response()
    }
}

pub async fn target(
    State(config): State<Arc<Config>>,
    headers: HeaderMap,
    body: Bytes,
) -> Acknowledgment {
    let ack = process(&config, &headers, &body).await;
    info!("Acknowledging with: {}", ack.as_str());
    ack
}

/// Run the whole pipeline for one event. Each stage either produces the
/// input of the next or terminates the pipeline with its acknowledgment;
/// an email is either fully sent or not sent at all.
async fn process(config: &Config, headers: &HeaderMap, payload: &[u8]) -> Acknowledgment {
    // 1. Validate the event and pull the checkout session out of it

    let session = match signature::checkout_session(headers, payload, &config.webhook_secret) {
        Ok(session) => session,
        Err(e) => {
            info!("Error validating Stripe event: {}", e);
            return Acknowledgment::NoCheckoutSession;
        }
    };
    info!("Received completed checkout session {}", session.id);

    // 2. Resolve the customer behind the session

    let Some(customer_id) = session.customer.as_deref() else {
        info!("Session {} carries no customer reference", session.id);
        return Acknowledgment::UnspecifiedCustomer;
    };
    let customer = match fetch::customer(&config.api_key, customer_id).await {
        Ok(customer) => customer,
        Err(e) => {
            info!("Error retrieving customer {}: {}", customer_id, e);
            return Acknowledgment::NoCustomer;
        }
    };
    info!("Retrieved customer {}", customer_id);

    // 3. Resolve the payment intent behind the session

    let Some(payment_id) = session.payment_intent.as_deref() else {
        info!("Session {} carries no payment intent reference", session.id);
        return Acknowledgment::UnspecifiedPaymentIntent;
    };
    let payment = match fetch::payment_intent(&config.api_key, payment_id).await {
        Ok(payment) => payment,
        Err(e) => {
            info!("Error retrieving payment intent {}: {}", payment_id, e);
            return Acknowledgment::NoPaymentIntent;
        }
    };
    info!("Retrieved payment intent {} for {} minor units", payment_id, payment.amount);

    // 4. Compose the notification email

    let mut message = Vec::new();
    let writer = match compose::order_summary(
        &session,
        &customer,
        &payment,
        &mut message,
        &compose::random_boundary(),
    ) {
        Ok(writer) => writer,
        Err(e) => {
            info!("Error composing email: {}", e);
            return Acknowledgment::NotComposed;
        }
    };
    let boundary = writer.boundary().to_string();
    if let Err(e) = writer.close() {
        info!("Error composing email: {}", e);
        return Acknowledgment::NotComposed;
    }

    // 5. Send it through SES

    let header = dispatch::header_of(&boundary, config);
    if let Err(e) = dispatch::send(&header, &message, config).await {
        info!("Error sending email: {}", e);
        return Acknowledgment::NotSent;
    }

    Acknowledgment::Ok
}

#[cfg(test)]
mod tests {
    use hmac::{Hmac, Mac};
    use pretty_assertions::assert_eq;
    use sha2::Sha256;

    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn config() -> Config {
        Config {
            webhook_secret: SECRET.into(),
            api_key: "sk_test_123".into(),
            sender: "order_notifier_bot@example.com".into(),
            recipient: "orders@example.com".into(),
            subject: "order".into(),
            region: "us-west-2".into(),
        }
    }

    fn signed_headers(payload: &[u8]) -> HeaderMap {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let header = format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()));
        let mut headers = HeaderMap::new();
        headers.insert("stripe-signature", header.parse().unwrap());
        headers
    }

    #[test]
    fn acknowledgment_strings_are_fixed() {
        assert_eq!(Acknowledgment::Ok.as_str(), "ok");
        assert_eq!(
            Acknowledgment::NoCheckoutSession.as_str(),
            "couldn't retrieve checkout session"
        );
        assert_eq!(Acknowledgment::UnspecifiedCustomer.as_str(), "unspecified customer");
        assert_eq!(Acknowledgment::NoCustomer.as_str(), "couldn't retrieve customer");
        assert_eq!(
            Acknowledgment::UnspecifiedPaymentIntent.as_str(),
            "unspecified payment intent"
        );
        assert_eq!(
            Acknowledgment::NoPaymentIntent.as_str(),
            "couldn't retrieve payment intent"
        );
        assert_eq!(Acknowledgment::NotComposed.as_str(), "couldn't compose email");
        assert_eq!(Acknowledgment::NotSent.as_str(), "couldn't send email");
    }

    #[tokio::test]
    async fn missing_signature_is_acknowledged_not_crashed() {
        let ack = process(&config(), &HeaderMap::new(), b"{}").await;
        assert_eq!(ack, Acknowledgment::NoCheckoutSession);
    }

    #[tokio::test]
    async fn unexpected_event_kind_halts_before_any_fetch() {
        let payload = br#"{"id": "evt_1", "type": "invoice.paid", "data": {"object": {}}}"#;
        let ack = process(&config(), &signed_headers(payload), payload).await;
        // Were a fetch attempted it would fail as NoCustomer, not here.
        assert_eq!(ack, Acknowledgment::NoCheckoutSession);
    }

    #[tokio::test]
    async fn session_without_customer_short_circuits() {
        let payload = br#"{
            "id": "evt_2",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_test_2", "payment_intent": "pi_2"}}
        }"#;
        let ack = process(&config(), &signed_headers(payload), payload).await;
        assert_eq!(ack, Acknowledgment::UnspecifiedCustomer);
    }

    #[tokio::test]
    async fn response_shape_is_always_200_text_html() {
        let response = target(
            State(Arc::new(config())),
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
        )
        .await
        .into_response();

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"couldn't retrieve checkout session");
    }
}
