// libs/booking-cell/src/services/notification.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;

use crate::models::BookingNotice;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification not configured: {0}")]
    NotConfigured(String),

    #[error("missing recipient address")]
    MissingRecipient,

    #[error("email provider error: {0}")]
    Provider(String),

    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Outbound messages triggered by booking transitions.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tells the administrator a new request is waiting, with a one-click approval link.
    async fn notify_admin(&self, notice: &BookingNotice, approval_link: &str) -> Result<(), NotificationError>;

    /// Tells the client their booking was approved.
    async fn notify_client_approved(&self, notice: &BookingNotice) -> Result<(), NotificationError>;
}

/// Chooses the Resend adapter when an API key is configured, mock mode otherwise.
pub fn build_notifier(config: &AppConfig) -> Arc<dyn Notifier> {
    if config.is_email_configured() {
        Arc::new(ResendNotifier::new(config))
    } else {
        warn!("Email sending is mocked. RESEND_API_KEY is not configured.");
        Arc::new(LogNotifier)
    }
}

#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: String,
}

/// Sends email through the Resend HTTP API.
pub struct ResendNotifier {
    client: Client,
    api_key: String,
    base_url: String,
    from: String,
    admin_email: String,
}

impl ResendNotifier {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.notification_timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: config.resend_api_key.clone(),
            base_url: config.resend_base_url.trim_end_matches('/').to_string(),
            from: config.email_from.clone(),
            admin_email: config.admin_email.clone(),
        }
    }

    async fn send(&self, email: ResendEmail<'_>) -> Result<(), NotificationError> {
        let url = format!("{}/emails", self.base_url);
        debug!("Sending '{}' to {:?}", email.subject, email.to);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Resend rejected email: {} - {}", status, body);
            return Err(NotificationError::Provider(format!("HTTP {}: {}", status, body)));
        }

        info!("Email '{}' accepted by provider", email.subject);
        Ok(())
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn notify_admin(&self, notice: &BookingNotice, approval_link: &str) -> Result<(), NotificationError> {
        if self.admin_email.is_empty() {
            return Err(NotificationError::NotConfigured(
                "Admin email not configured. Cannot send approval email.".to_string(),
            ));
        }

        self.send(ResendEmail {
            from: &self.from,
            to: vec![&self.admin_email],
            subject: "New Booking Request - Action Required",
            html: admin_email_html(notice, approval_link),
        })
        .await
    }

    async fn notify_client_approved(&self, notice: &BookingNotice) -> Result<(), NotificationError> {
        if notice.client_email.trim().is_empty() {
            error!("Client email is missing, cannot send confirmation for booking {}", notice.booking_id);
            return Err(NotificationError::MissingRecipient);
        }

        self.send(ResendEmail {
            from: &self.from,
            to: vec![&notice.client_email],
            subject: "Booking Confirmed - Luxe Salon",
            html: client_email_html(notice),
        })
        .await
    }
}

/// Mock mode: records what would have been sent.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_admin(&self, notice: &BookingNotice, approval_link: &str) -> Result<(), NotificationError> {
        warn!(
            "Email mocked: admin approval request for booking {} ({} on {} at {}), link {}",
            notice.booking_id, notice.client_name, notice.date, notice.time, approval_link
        );
        Ok(())
    }

    async fn notify_client_approved(&self, notice: &BookingNotice) -> Result<(), NotificationError> {
        warn!(
            "Email mocked: confirmation for booking {} to {}",
            notice.booking_id, notice.client_email
        );
        Ok(())
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn service_label(notice: &BookingNotice) -> String {
    escape_html(notice.service_name.as_deref().unwrap_or("Service"))
}

pub fn admin_email_html(notice: &BookingNotice, approval_link: &str) -> String {
    format!(
        r#"<h1>New Booking Request</h1>
<p><strong>Client:</strong> {client}</p>
<p><strong>Service:</strong> {service}</p>
<p><strong>Date:</strong> {date} at {time}</p>
<p><strong>Phone:</strong> {phone}</p>
<p><strong>Email:</strong> {email}</p>
<br/>
<a href="{link}" style="background-color: #5F4A8B; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px;">Approve Booking</a>"#,
        client = escape_html(&notice.client_name),
        service = service_label(notice),
        date = notice.date,
        time = notice.time,
        phone = escape_html(&notice.client_phone),
        email = escape_html(&notice.client_email),
        link = escape_html(approval_link),
    )
}

pub fn client_email_html(notice: &BookingNotice) -> String {
    format!(
        r#"<h1>Booking Confirmed!</h1>
<p>Hi {client},</p>
<p>Your appointment has been confirmed.</p>
<p><strong>Service:</strong> {service}</p>
<p><strong>Date:</strong> {date} at {time}</p>
<br/>
<p>We look forward to seeing you!</p>"#,
        client = escape_html(&notice.client_name),
        service = service_label(notice),
        date = notice.date,
        time = notice.time,
    )
}
