//! Outbound mail. Delivery runs in the background: a failed send is
//! logged but never fails the request that triggered it.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::MailConfig;

#[derive(Clone)]
pub struct Mailer {
    config: MailConfig,
    base_url: String,
}

impl Mailer {
    pub fn new(config: MailConfig, base_url: String) -> Self {
        Self { config, base_url }
    }

    /// Queue a verification email carrying the confirmation link. Returns
    /// immediately; SMTP I/O happens on the blocking pool.
    pub fn send_verification(&self, to_email: &str, username: &str, token: &str) {
        let config = self.config.clone();
        let to_email = to_email.to_string();
        let username = username.to_string();
        let link = format!("{}/api/auth/confirmed_email/{}", self.base_url, token);

        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || {
                deliver_verification(&config, &to_email, &username, &link)
            })
            .await;

            match result {
                Ok(Ok(())) => tracing::info!("verification email sent"),
                Ok(Err(e)) => tracing::error!("failed to send verification email: {}", e),
                Err(e) => tracing::error!("email task panicked: {}", e),
            }
        });
    }
}

fn deliver_verification(
    config: &MailConfig,
    to_email: &str,
    username: &str,
    link: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let body = format!(
        "<h3>Hi {username},</h3>\
         <p>Please confirm your email address by following the link below.</p>\
         <p><a href=\"{link}\">Confirm email</a></p>\
         <p>If you did not sign up, you can ignore this message.</p>"
    );

    let message = Message::builder()
        .from(config.from.parse()?)
        .to(to_email.parse()?)
        .subject("Confirm your email")
        .header(ContentType::TEXT_HTML)
        .body(body)?;

    let credentials = Credentials::new(config.username.clone(), config.password.clone());
    let transport = SmtpTransport::relay(&config.server)?
        .port(config.port)
        .credentials(credentials)
        .build();

    transport.send(&message)?;
    Ok(())
}
