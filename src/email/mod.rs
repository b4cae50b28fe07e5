use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use crate::config::SmtpConfig;

/// SMTP bridge used by the relay endpoint. Built once at startup; the
/// transport connects lazily on first send.
pub struct BridgeMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl BridgeMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP starttls error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self { transport })
    }

    /// Relay one plain-text message. Returns the generated Message-ID.
    pub async fn send(
        &self,
        to: &str,
        from: &str,
        subject: &str,
        text: &str,
    ) -> Result<String, String> {
        let message_id = format!("<{}@formbridge>", Uuid::now_v7());

        let message = Message::builder()
            .from(from.parse().map_err(|e| format!("Invalid from address: {e}"))?)
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(message_id)
    }
}
