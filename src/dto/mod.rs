use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Round history and audit log payloads.
pub mod admin;
/// Game settings, timer and action payloads.
pub mod game;
/// Health check payload.
pub mod health;
/// Participant roster payloads.
pub mod participant;
/// Server-sent event envelope.
pub mod sse;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC 3339 timestamp sent by a client.
fn parse_system_time(value: &str) -> Result<SystemTime, time::error::Parse> {
    OffsetDateTime::parse(value, &Rfc3339).map(SystemTime::from)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timestamps_use_rfc3339() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let formatted = format_system_time(time);
        assert_eq!(formatted, "2023-11-14T22:13:20Z");
        assert_eq!(parse_system_time(&formatted).unwrap(), time);
        assert!(parse_system_time("yesterday").is_err());
    }
}
