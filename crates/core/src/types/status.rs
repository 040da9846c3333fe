//! Status values for custom order requests.

use core::fmt;

/// Lifecycle of a custom order request.
///
/// The backend tracks status as a free string. Known values map onto the
/// named variants; anything else is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CustomOrderStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Completed,
    Other(String),
}

impl CustomOrderStatus {
    /// Parse a backend status string (case-insensitive).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "accepted" => Self::Accepted,
            "declined" | "rejected" => Self::Declined,
            "completed" | "fulfilled" => Self::Completed,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Declined => "Declined",
            Self::Completed => "Completed",
            Self::Other(raw) => raw,
        }
    }

    /// Whether the shop still has to act on the request.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }
}

impl fmt::Display for CustomOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_known() {
        assert_eq!(CustomOrderStatus::parse("pending"), CustomOrderStatus::Pending);
        assert_eq!(CustomOrderStatus::parse("Accepted"), CustomOrderStatus::Accepted);
        assert_eq!(CustomOrderStatus::parse("rejected"), CustomOrderStatus::Declined);
    }

    #[test]
    fn test_status_parse_unknown_preserved() {
        let status = CustomOrderStatus::parse("shipping soon");
        assert_eq!(status, CustomOrderStatus::Other("shipping soon".to_string()));
        assert_eq!(status.to_string(), "shipping soon");
        assert!(!status.is_open());
    }
}
