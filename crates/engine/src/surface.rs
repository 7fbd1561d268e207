use std::fmt;

use serde::{Deserialize, Serialize};

/// Named premium actions the live surface intercepts.
///
/// Invoking one never performs the underlying action; the session emits a
/// single restriction signal carrying the feature name instead. This is a
/// deliberate entitlement boundary, not an error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestrictedFeature {
    Attachments,
    PrivateCalls,
    VoiceMessages,
    GroupAccess,
}

impl RestrictedFeature {
    pub const ALL: [RestrictedFeature; 4] = [
        RestrictedFeature::Attachments,
        RestrictedFeature::PrivateCalls,
        RestrictedFeature::VoiceMessages,
        RestrictedFeature::GroupAccess,
    ];

    /// Display name carried by the restriction signal.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Attachments => "Attachments",
            Self::PrivateCalls => "Private calls",
            Self::VoiceMessages => "Voice messages",
            Self::GroupAccess => "Group access",
        }
    }

    /// Upsell copy shown in place of the real action.
    pub fn upsell_notice(&self) -> String {
        format!("{} are available on the full plan", self.name())
    }
}

impl fmt::Display for RestrictedFeature {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Validates raw send input. Empty or whitespace-only text is a silent
/// no-op, not an error; anything else is passed through untouched.
pub fn accept_send_text(text: &str) -> Option<&str> {
    if text.trim().is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_sends_are_rejected() {
        assert_eq!(accept_send_text(""), None);
        assert_eq!(accept_send_text("   \n\t"), None);
        assert_eq!(accept_send_text("hello"), Some("hello"));
        // Content is not trimmed, only gated.
        assert_eq!(accept_send_text("  hi  "), Some("  hi  "));
    }

    #[test]
    fn every_gated_feature_carries_a_stable_name() {
        for feature in RestrictedFeature::ALL {
            assert!(!feature.name().is_empty());
            assert!(feature.upsell_notice().contains(feature.name()));
        }
        assert_eq!(RestrictedFeature::Attachments.name(), "Attachments");
    }
}
