//! ConnectionState - Live Update Connection Banner
//!
//! Tracks the socket that pushes live updates and derives the banner shown
//! above the analytics page.

use crate::eventing::StatusLevel;

/// Lifecycle events reported by the live update socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Connecting,
    Open,
    Closed { code: Option<u16>, reason: String },
    Error(String),
    Reconnecting { attempt: u32 },
}

/// Current socket status
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Closed { code: Option<u16>, reason: String },
    Failed(String),
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "Idle",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Reconnecting { .. } => "Reconnecting",
            ConnectionStatus::Closed { .. } => "Disconnected",
            ConnectionStatus::Failed(_) => "Error",
        }
    }
}

/// Normal closure, not worth a warning
const NORMAL_CLOSURE: u16 = 1000;

/// Banner state for the live update connection
#[derive(Debug, Clone, Default)]
pub struct ConnectionBanner {
    status: ConnectionStatus,
    ever_connected: bool,
    reconnected: bool,
}

impl ConnectionBanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a socket event; returns whether the banner changed
    pub fn apply(&mut self, event: SocketEvent) -> bool {
        let before = (self.message(), self.is_visible());

        self.status = match event {
            SocketEvent::Connecting => ConnectionStatus::Connecting,
            SocketEvent::Open => {
                self.reconnected = self.ever_connected;
                self.ever_connected = true;
                ConnectionStatus::Connected
            }
            SocketEvent::Closed { code, reason } => {
                self.reconnected = false;
                ConnectionStatus::Closed { code, reason }
            }
            SocketEvent::Error(message) => {
                self.reconnected = false;
                ConnectionStatus::Failed(message)
            }
            SocketEvent::Reconnecting { attempt } => {
                self.reconnected = false;
                ConnectionStatus::Reconnecting { attempt }
            }
        };

        tracing::debug!(status = self.status.label(), "Live connection status changed");
        before != (self.message(), self.is_visible())
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Hidden while idle or connected, except for the post-reconnect notice
    pub fn is_visible(&self) -> bool {
        match self.status {
            ConnectionStatus::Idle => false,
            ConnectionStatus::Connected => self.reconnected,
            _ => true,
        }
    }

    pub fn message(&self) -> Option<String> {
        if !self.is_visible() {
            return None;
        }

        Some(match &self.status {
            ConnectionStatus::Idle => return None,
            ConnectionStatus::Connecting => "Connecting to live updates...".to_string(),
            ConnectionStatus::Connected => "Reconnected to live updates".to_string(),
            ConnectionStatus::Reconnecting { attempt } => {
                format!("Connection lost. Reconnecting (attempt {attempt})...")
            }
            ConnectionStatus::Closed { code, reason } => {
                let mut text = "Live updates disconnected".to_string();
                if let Some(code) = code {
                    text.push_str(&format!(" (code {code})"));
                }
                if !reason.trim().is_empty() {
                    text.push_str(": ");
                    text.push_str(reason.trim());
                }
                text
            }
            ConnectionStatus::Failed(message) => format!("Live update error: {message}"),
        })
    }

    pub fn severity(&self) -> Option<StatusLevel> {
        if !self.is_visible() {
            return None;
        }

        Some(match &self.status {
            ConnectionStatus::Idle | ConnectionStatus::Connecting => StatusLevel::Info,
            ConnectionStatus::Connected => StatusLevel::Success,
            ConnectionStatus::Reconnecting { .. } => StatusLevel::Warn,
            ConnectionStatus::Closed { code, .. } if *code == Some(NORMAL_CLOSURE) => StatusLevel::Info,
            ConnectionStatus::Closed { .. } => StatusLevel::Warn,
            ConnectionStatus::Failed(_) => StatusLevel::Error,
        })
    }

    /// Hide the "Reconnected" notice
    pub fn dismiss(&mut self) {
        self.reconnected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_until_something_happens() {
        let banner = ConnectionBanner::new();
        assert!(!banner.is_visible());
        assert_eq!(banner.message(), None);
        assert_eq!(banner.severity(), None);
    }

    #[test]
    fn first_connection_hides_banner() {
        let mut banner = ConnectionBanner::new();
        assert!(banner.apply(SocketEvent::Connecting));
        assert_eq!(banner.message().as_deref(), Some("Connecting to live updates..."));

        assert!(banner.apply(SocketEvent::Open));
        assert!(banner.is_connected());
        assert!(!banner.is_visible());
    }

    #[test]
    fn reconnect_shows_notice_until_dismissed() {
        let mut banner = ConnectionBanner::new();
        banner.apply(SocketEvent::Open);
        banner.apply(SocketEvent::Closed {
            code: Some(1006),
            reason: String::new(),
        });
        assert_eq!(
            banner.message().as_deref(),
            Some("Live updates disconnected (code 1006)")
        );
        assert_eq!(banner.severity(), Some(StatusLevel::Warn));

        banner.apply(SocketEvent::Reconnecting { attempt: 2 });
        assert_eq!(
            banner.message().as_deref(),
            Some("Connection lost. Reconnecting (attempt 2)...")
        );

        banner.apply(SocketEvent::Open);
        assert!(banner.is_visible());
        assert_eq!(banner.message().as_deref(), Some("Reconnected to live updates"));
        assert_eq!(banner.severity(), Some(StatusLevel::Success));

        banner.dismiss();
        assert!(!banner.is_visible());
    }

    #[test]
    fn errors_and_normal_closure() {
        let mut banner = ConnectionBanner::new();
        banner.apply(SocketEvent::Error("handshake failed".into()));
        assert_eq!(banner.severity(), Some(StatusLevel::Error));
        assert_eq!(
            banner.message().as_deref(),
            Some("Live update error: handshake failed")
        );

        banner.apply(SocketEvent::Closed {
            code: Some(1000),
            reason: "server shutdown".into(),
        });
        assert_eq!(banner.severity(), Some(StatusLevel::Info));
        assert_eq!(banner.status().label(), "Disconnected");
    }

    #[test]
    fn repeated_event_reports_no_change() {
        let mut banner = ConnectionBanner::new();
        assert!(banner.apply(SocketEvent::Reconnecting { attempt: 1 }));
        assert!(!banner.apply(SocketEvent::Reconnecting { attempt: 1 }));
    }
}
