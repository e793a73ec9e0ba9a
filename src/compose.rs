use std::io::Write;

use rand::{distributions::Alphanumeric, Rng};
use thiserror::Error;

use crate::model::{CheckoutSession, Customer, PaymentIntent};

#[derive(Debug, Error)]
#[error("message buffer write failed: {0}")]
pub struct ComposeError(#[from] std::io::Error);

/// Writer for a multipart message body bound to one boundary token. Parts
/// are framed with CRLF per MIME; the part text itself is written as-is.
/// `close` must be called before the underlying buffer is read.
pub struct MultipartWriter<'a> {
    message: &'a mut Vec<u8>,
    boundary: String,
}

impl<'a> MultipartWriter<'a> {
    pub fn new(message: &'a mut Vec<u8>, boundary: &str) -> Self {
        MultipartWriter {
            message,
            boundary: boundary.to_string(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Open the text part: boundary line, part header, blank line.
    fn open_text_part(&mut self) -> Result<(), ComposeError> {
        write!(self.message, "--{}\r\n", self.boundary)?;
        write!(self.message, "Content-Type: text/plain; charset=utf-8\r\n")?;
        write!(self.message, "Content-Transfer-Encoding: quoted-printable\r\n\r\n")?;
        Ok(())
    }

    /// Write the closing boundary and release the buffer for reading.
    pub fn close(self) -> Result<(), ComposeError> {
        write!(self.message, "\r\n--{}--\r\n", self.boundary)?;
        Ok(())
    }
}

/// Fresh boundary token for production sends; tests pass a fixed one.
pub fn random_boundary() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}

/// Render the order summary derived from the checkout session into the
/// given buffer as the text part of a multipart message, and return the
/// writer so the caller can finalize it.
pub fn order_summary<'a>(
    session: &CheckoutSession,
    customer: &Customer,
    payment: &PaymentIntent,
    message: &'a mut Vec<u8>,
    boundary: &str,
) -> Result<MultipartWriter<'a>, ComposeError> {
    let mut writer = MultipartWriter::new(message, boundary);
    writer.open_text_part()?;

    let amount = payment.amount as f64 / 100.0;
    // A malformed link is not worth losing the notification over; it just
    // renders empty.
    let payment_url = hex::decode(payment.payment_link())
        .ok()
        .and_then(|raw| String::from_utf8(raw).ok())
        .unwrap_or_default();

    let body = &mut *writer.message;
    write!(body, "checkout session ID: {}\n\n", session.id)?;
    if let Some(reference) = session.client_reference_id.as_deref().filter(|r| !r.is_empty()) {
        write!(body, "customer reference: {}\n\n", reference)?;
    }
    write!(body, "email: {}\n\n", customer.email())?;

    let shipping = customer.shipping.clone().unwrap_or_default();
    write!(body, "phone: {}\n\n", shipping.phone())?;

    if payment.quantity() == "1" {
        write!(body, "order of 1 item at £{:.2} to \n\n", amount)?;
    } else {
        write!(body, "order of {} items at £{:.2} to \n\n", payment.quantity(), amount)?;
    }

    if payment.company().is_empty() {
        write!(body, "{}\n", shipping.name())?;
    } else {
        write!(body, "{}\n{}\n", shipping.name(), payment.company())?;
    }

    let address = shipping.address.clone().unwrap_or_default();
    if address.line2().is_empty() {
        write!(
            body,
            "{}\n{}\n{}\n{}\n{}\n\n",
            address.line1(),
            address.city(),
            address.state(),
            address.postal_code(),
            address.country()
        )?;
    } else {
        write!(
            body,
            "{}\n{}\n{}\n{}\n{}\n{}\n\n",
            address.line1(),
            address.line2(),
            address.city(),
            address.state(),
            address.postal_code(),
            address.country()
        )?;
    }

    write!(body, "to ship by {} payable at\n\n{}\n", payment.courier_name(), payment_url)?;
    Ok(writer)
}
