use std::sync::Mutex;

use crate::badge::{Badge, BadgeSink};

/// Maximum number of query characters shown in a failure notification.
const QUERY_DISPLAY_CHARS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Completed,
    Failed,
}

/// A transient user-visible message about one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn completed(count: usize) -> Self {
        Self {
            kind: NotificationKind::Completed,
            title: "Fact Check Complete".to_string(),
            message: format!("Found {} result{}", count, if count == 1 { "" } else { "s" }),
        }
    }

    pub fn failed(query: &str) -> Self {
        Self {
            kind: NotificationKind::Failed,
            title: "Fact Check Failed".to_string(),
            message: format!(
                "Unable to check \"{}\". Please try again.",
                truncate_query(query)
            ),
        }
    }
}

/// Shorten a query for display, appending "..." when cut.
pub fn truncate_query(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.chars().count() <= QUERY_DISPLAY_CHARS {
        return trimmed.to_string();
    }
    let mut short: String = trimmed.chars().take(QUERY_DISPLAY_CHARS).collect();
    short.push_str("...");
    short
}

/// Shows notifications to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Badge and notification collaborator that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl BadgeSink for TracingSink {
    fn set_badge(&self, badge: Badge) {
        tracing::debug!(text = %badge.text(), color = badge.color(), "badge");
    }
}

impl Notifier for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Completed => {
                tracing::info!(title = %notification.title, "{}", notification.message)
            }
            NotificationKind::Failed => {
                tracing::warn!(title = %notification.title, "{}", notification.message)
            }
        }
    }
}

/// Collaborator that remembers every badge and notification, for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    badges: Mutex<Vec<Badge>>,
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn badges(&self) -> Vec<Badge> {
        self.badges.lock().map(|b| b.clone()).unwrap_or_default()
    }

    pub fn last_badge(&self) -> Option<Badge> {
        self.badges().last().copied()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

impl BadgeSink for RecordingSink {
    fn set_badge(&self, badge: Badge) {
        if let Ok(mut badges) = self.badges.lock() {
            badges.push(badge);
        }
    }
}

impl Notifier for RecordingSink {
    fn notify(&self, notification: Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_pluralizes() {
        assert_eq!(Notification::completed(1).message, "Found 1 result");
        assert_eq!(Notification::completed(0).message, "Found 0 results");
        assert_eq!(Notification::completed(3).message, "Found 3 results");
    }

    #[test]
    fn failed_truncates_long_queries() {
        let query = "a".repeat(60);
        let n = Notification::failed(&query);
        assert_eq!(n.kind, NotificationKind::Failed);
        assert!(n.message.contains(&format!("{}...", "a".repeat(40))));
        assert!(!n.message.contains(&"a".repeat(41)));
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let query = "é".repeat(45);
        assert_eq!(truncate_query(&query).chars().count(), 43);
        assert_eq!(truncate_query("  short  "), "short");
    }
}
