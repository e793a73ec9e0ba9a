use aws_config::{BehaviorVersion, Region};
use aws_sdk_sesv2::primitives::Blob;
use aws_sdk_sesv2::types::{Destination, EmailContent, RawMessage};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("raw message rejected: {0}")]
    Message(String),
    #[error("mail send failed: {0}")]
    Provider(String),
}

/// The email header for a given multipart boundary. The subject has to be
/// the last line before the blank terminator or SES mangles the message.
pub fn header_of(boundary: &str, config: &Config) -> Vec<u8> {
    let mut header = String::new();
    header.push_str("MIME-Version: 1.0\n");
    header.push_str("Content-Disposition: inline\n");
    header.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{}\"\n",
        boundary
    ));
    header.push_str(&format!("From: {}\n", config.sender));
    header.push_str(&format!("To: {}\n", config.recipient));
    header.push_str(&format!("Subject: {}\n\n", config.subject));
    header.into_bytes()
}

/// Put the header and the finalized message body together and hand them to
/// SES as one raw email. The header's own blank-line terminator already
/// separates it from the MIME body, so nothing goes in between.
pub async fn send(header: &[u8], message: &[u8], config: &Config) -> Result<(), DispatchError> {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;
    let client = aws_sdk_sesv2::Client::new(&sdk_config);

    let raw = RawMessage::builder()
        .data(Blob::new([header, message].concat()))
        .build()
        .map_err(|e| DispatchError::Message(e.to_string()))?;

    client
        .send_email()
        .from_email_address(&config.sender)
        .destination(
            Destination::builder()
                .to_addresses(&config.recipient)
                .build(),
        )
        .content(EmailContent::builder().raw(raw).build())
        .send()
        .await
        .map_err(|e| DispatchError::Provider(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config() -> Config {
        Config {
            webhook_secret: "whsec_test".into(),
            api_key: "sk_test_123".into(),
            sender: "order_notifier_bot@example.com".into(),
            recipient: "orders@example.com".into(),
            subject: "order".into(),
            region: "us-west-2".into(),
        }
    }

    #[test]
    fn header_carries_the_boundary_and_addresses() {
        let header = String::from_utf8(header_of("tok123", &config())).unwrap();
        assert_eq!(
            header,
            "MIME-Version: 1.0\n\
             Content-Disposition: inline\n\
             Content-Type: multipart/mixed; boundary=\"tok123\"\n\
             From: order_notifier_bot@example.com\n\
             To: orders@example.com\n\
             Subject: order\n\n"
        );
    }

    #[test]
    fn subject_is_the_last_header_line() {
        let header = String::from_utf8(header_of("tok123", &config())).unwrap();
        let before_terminator = header.strip_suffix("\n\n").unwrap();
        assert!(before_terminator.lines().last().unwrap().starts_with("Subject: "));
    }
}
