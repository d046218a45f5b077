/**
 * Outbound Email Queue
 *
 * Handlers enqueue `EmailJob`s and move on. When email is enabled a single
 * worker task drains the queue over SMTP; when it is disabled (the default)
 * or misconfigured, jobs are logged and dropped. Nothing waits on delivery
 * and delivery failures never reach the client.
 */

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::backend::server::config::EmailConfig;

/// Jobs waiting beyond this are dropped with a warning
const QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp failure: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// An email to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailJob {
    Welcome { to: String, username: String },
    SubscriptionActivated { to: String, username: String, plan: String },
    SubscriptionCanceled { to: String, username: String },
}

impl EmailJob {
    pub fn recipient(&self) -> &str {
        match self {
            EmailJob::Welcome { to, .. }
            | EmailJob::SubscriptionActivated { to, .. }
            | EmailJob::SubscriptionCanceled { to, .. } => to,
        }
    }

    pub fn subject(&self) -> String {
        match self {
            EmailJob::Welcome { .. } => "Welcome to Stride".to_string(),
            EmailJob::SubscriptionActivated { .. } => "Your premium plan is active".to_string(),
            EmailJob::SubscriptionCanceled { .. } => "Your subscription was canceled".to_string(),
        }
    }

    pub fn body(&self) -> String {
        match self {
            EmailJob::Welcome { username, .. } => format!(
                "Hi {},\n\nThanks for joining Stride. Set your first goal and invite a friend to get going.\n",
                username
            ),
            EmailJob::SubscriptionActivated { username, plan, .. } => format!(
                "Hi {},\n\nYour {} subscription is now active. Enjoy unlimited goals and groups.\n",
                username, plan
            ),
            EmailJob::SubscriptionCanceled { username, .. } => format!(
                "Hi {},\n\nYour subscription has ended and your account is back on the free plan.\n",
                username
            ),
        }
    }

    fn to_message(&self, from: &Mailbox) -> Result<Message, EmailError> {
        let message = Message::builder()
            .from(from.clone())
            .to(self.recipient().parse::<Mailbox>()?)
            .subject(self.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(self.body())?;
        Ok(message)
    }
}

/// Handle for enqueuing email jobs
#[derive(Clone, Default)]
pub struct EmailQueue {
    sender: Option<mpsc::Sender<EmailJob>>,
}

impl EmailQueue {
    /// Queue that logs and drops every job
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Start the SMTP worker if email is enabled and configured
    pub fn start(config: &EmailConfig) -> Self {
        if !config.enabled {
            tracing::info!("Email delivery disabled");
            return Self::disabled();
        }

        match build_worker(config) {
            Ok((transport, from)) => {
                let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
                tokio::spawn(run_worker(transport, from, receiver));
                tracing::info!("Email worker started");
                Self { sender: Some(sender) }
            }
            Err(e) => {
                tracing::warn!("Email is enabled but misconfigured ({}); delivery disabled", e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue a job; returns whether it was accepted for delivery
    pub fn enqueue(&self, job: EmailJob) -> bool {
        match &self.sender {
            None => {
                tracing::debug!("Email disabled; dropping '{}' to {}", job.subject(), job.recipient());
                false
            }
            Some(sender) => match sender.try_send(job) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Email queue rejected job: {}", e);
                    false
                }
            },
        }
    }
}

fn build_worker(
    config: &EmailConfig,
) -> Result<(AsyncSmtpTransport<Tokio1Executor>, Mailbox), EmailError> {
    let host = config.smtp_host.as_deref().unwrap_or("localhost");
    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(config.smtp_port);
    if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }
    let from = config.from_address.parse::<Mailbox>()?;
    Ok((builder.build(), from))
}

async fn run_worker(
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    mut receiver: mpsc::Receiver<EmailJob>,
) {
    while let Some(job) = receiver.recv().await {
        let message = match job.to_message(&from) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Skipping email to {}: {}", job.recipient(), e);
                continue;
            }
        };
        match transport.send(message).await {
            Ok(_) => tracing::info!("Sent '{}' to {}", job.subject(), job.recipient()),
            Err(e) => tracing::warn!("Failed to send email to {}: {}", job.recipient(), e),
        }
    }
    tracing::info!("Email worker stopped");
}
