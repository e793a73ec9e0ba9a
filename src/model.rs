use std::collections::HashMap;

use serde::Deserialize;

/// Verified webhook event envelope. Only the `type` tag and the embedded
/// object are read; everything else Stripe sends is ignored.
#[derive(Deserialize, Debug)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Deserialize, Debug)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The completed checkout session carried in the event payload. The customer
/// and payment intent arrive as bare ids in webhook payloads; `None` covers
/// both JSON null and absence.
#[derive(Deserialize, Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub client_reference_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Customer {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub shipping: Option<Shipping>,
}

impl Customer {
    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Shipping {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

impl Shipping {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn phone(&self) -> &str {
        self.phone.as_deref().unwrap_or_default()
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Address {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Address {
    pub fn line1(&self) -> &str {
        self.line1.as_deref().unwrap_or_default()
    }

    pub fn line2(&self) -> &str {
        self.line2.as_deref().unwrap_or_default()
    }

    pub fn city(&self) -> &str {
        self.city.as_deref().unwrap_or_default()
    }

    pub fn state(&self) -> &str {
        self.state.as_deref().unwrap_or_default()
    }

    pub fn postal_code(&self) -> &str {
        self.postal_code.as_deref().unwrap_or_default()
    }

    pub fn country(&self) -> &str {
        self.country.as_deref().unwrap_or_default()
    }
}

/// Payment intent with the free-form metadata attached by whatever created
/// the checkout session. Four keys are meaningful to the order summary; all
/// of them fall back to the empty string when absent.
#[derive(Deserialize, Debug, Clone)]
pub struct PaymentIntent {
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn meta(&self, key: &str) -> &str {
        self.metadata.get(key).map(String::as_str).unwrap_or_default()
    }

    pub fn quantity(&self) -> &str {
        self.meta("quantity")
    }

    pub fn company(&self) -> &str {
        self.meta("company")
    }

    pub fn courier_name(&self) -> &str {
        self.meta("courier_name")
    }

    /// Url to pay the courier, stored hex-encoded by the session creator.
    pub fn payment_link(&self) -> &str {
        self.meta("payment_link")
    }
}
