//! Match provisioning and invite codes.

use thiserror::Error;

/// A malformed invite code.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed invite code {code:?}")]
pub struct InviteCodeError {
    pub code: String,
}

/// Everything both peers need to sit down at the same match.
///
/// The host provisions a setup, keeps the host ticket for itself and
/// hands the whole thing to the guest as an invite code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSetup {
    pub conversation_id: String,
    pub share_token: String,
    pub host_ticket: String,
    pub guest_ticket: String,
}

impl MatchSetup {
    /// Provisions a fresh match; both player tickets are minted here.
    pub fn new(conversation_id: impl Into<String>, share_token: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            share_token: share_token.into(),
            host_ticket: mint_ticket(),
            guest_ticket: mint_ticket(),
        }
    }

    /// One line the host hands to the guest out of band.
    pub fn invite_code(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.conversation_id, self.share_token, self.host_ticket, self.guest_ticket
        )
    }

    /// Parses an invite code back into a setup.
    pub fn parse_invite_code(code: &str) -> Result<Self, InviteCodeError> {
        let mut parts = code.split(':');
        let (Some(conversation_id), Some(share_token), Some(host_ticket), Some(guest_ticket), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(InviteCodeError {
                code: code.to_string(),
            });
        };

        if conversation_id.is_empty()
            || share_token.is_empty()
            || host_ticket.is_empty()
            || guest_ticket.is_empty()
        {
            return Err(InviteCodeError {
                code: code.to_string(),
            });
        }

        Ok(Self {
            conversation_id: conversation_id.to_string(),
            share_token: share_token.to_string(),
            host_ticket: host_ticket.to_string(),
            guest_ticket: guest_ticket.to_string(),
        })
    }
}

/// Mints a fresh player ticket.
///
/// A ticket is 32 lowercase hex characters: exactly the sender field
/// width, and never containing the padding character.
pub fn mint_ticket() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_code_round_trip() {
        let setup = MatchSetup::new("12345678", "a1B2c3D4");
        let parsed = MatchSetup::parse_invite_code(&setup.invite_code()).unwrap();
        assert_eq!(parsed, setup);
    }

    #[test]
    fn tickets_fit_the_sender_field() {
        let setup = MatchSetup::new("g1", "tok");
        for ticket in [&setup.host_ticket, &setup.guest_ticket] {
            assert_eq!(ticket.chars().count(), 32);
            assert!(!ticket.contains('A'));
            groupwire_protocol::encode(ticket, "rock").unwrap();
        }
        assert_ne!(setup.host_ticket, setup.guest_ticket);
    }

    #[test]
    fn malformed_invite_codes_are_rejected() {
        for bad in ["", "a:b:c", "a:b:c:d:e", ":b:c:d", "a:b:c:"] {
            let err = MatchSetup::parse_invite_code(bad).unwrap_err();
            assert_eq!(err.code, bad);
        }
    }
}
