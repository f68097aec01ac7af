//! Author notifications for course status changes.
//!
//! [`StatusNotifier`] subscribes to the [`EventBus`](crate::bus::EventBus),
//! picks out `course.status_changed` events, looks up the course author, and
//! emails them. It runs as a long-lived background task and exits when the
//! bus sender is dropped. Failures are logged and never reach the
//! transition that produced the event.

use lectern_core::lifecycle::status::CourseStatus;
use lectern_db::repositories::UserRepo;
use lectern_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::{CourseStatusChanged, PlatformEvent};
use crate::delivery::email::{EmailDelivery, OutgoingEmail};

/// What happened to a single status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    /// SMTP is not configured or the author no longer exists.
    Skipped,
    Failed,
}

/// Counters reported by [`StatusNotifier::run`] when the bus closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierSummary {
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Events dropped because the receiver fell behind.
    pub lagged: u64,
}

impl NotifierSummary {
    fn record(&mut self, outcome: NotificationOutcome) {
        match outcome {
            NotificationOutcome::Sent => self.sent += 1,
            NotificationOutcome::Skipped => self.skipped += 1,
            NotificationOutcome::Failed => self.failed += 1,
        }
    }
}

/// Background service that emails authors about status changes.
pub struct StatusNotifier {
    pool: DbPool,
    email: Option<EmailDelivery>,
}

impl StatusNotifier {
    /// `email` is `None` when SMTP is not configured; notifications are then
    /// logged and skipped.
    pub fn new(pool: DbPool, email: Option<EmailDelivery>) -> Self {
        Self { pool, email }
    }

    /// Consume events until every bus sender is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) -> NotifierSummary {
        let mut summary = NotifierSummary::default();
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Some(change) = event.course_status_changed() {
                        summary.record(self.notify(&change).await);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    summary.lagged += n;
                    tracing::warn!(skipped = n, "Status notifier lagged, some notifications were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(?summary, "Event bus closed, status notifier shutting down");
                    return summary;
                }
            }
        }
    }

    async fn notify(&self, change: &CourseStatusChanged) -> NotificationOutcome {
        let Some(email) = &self.email else {
            tracing::info!(
                course_id = change.course_id,
                author_id = change.author_id,
                to = %change.to,
                "SMTP not configured, skipping status notification"
            );
            return NotificationOutcome::Skipped;
        };

        let author = match UserRepo::find_by_id(&self.pool, change.author_id).await {
            Ok(Some(author)) => author,
            Ok(None) => {
                tracing::warn!(author_id = change.author_id, "Course author not found, skipping notification");
                return NotificationOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!(error = %e, author_id = change.author_id, "Failed to look up course author");
                return NotificationOutcome::Failed;
            }
        };

        let outgoing = compose_status_email(&author.email, &author.display_name, change);
        match email.deliver(&outgoing).await {
            Ok(()) => NotificationOutcome::Sent,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    course_id = change.course_id,
                    to = %outgoing.to,
                    "Failed to send status notification"
                );
                NotificationOutcome::Failed
            }
        }
    }
}

/// Build the email telling an author their course changed status.
pub fn compose_status_email(
    to: &str,
    author_name: &str,
    change: &CourseStatusChanged,
) -> OutgoingEmail {
    let subject = match change.to {
        CourseStatus::InReview => format!("\"{}\" was submitted for review", change.course_title),
        CourseStatus::Published => format!("\"{}\" is now published", change.course_title),
        CourseStatus::Rejected => format!("\"{}\" needs changes", change.course_title),
        CourseStatus::Archived => format!("\"{}\" was archived", change.course_title),
        CourseStatus::SoftDeleted => format!("\"{}\" was deleted", change.course_title),
        CourseStatus::Draft => format!("\"{}\" is back in draft", change.course_title),
    };

    let mut body = format!(
        "Hi {author_name},\n\nYour course \"{}\" moved from {} to {}.\n",
        change.course_title,
        change.from.label(),
        change.to.label(),
    );
    if let Some(reason) = change.reason.as_deref().filter(|r| !r.trim().is_empty()) {
        body.push_str(&format!("\nReason: {reason}\n"));
    }
    body.push_str(&format!("\n{}\n", change.to.description()));

    OutgoingEmail {
        to: to.to_string(),
        subject,
        body,
    }
}
