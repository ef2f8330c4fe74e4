//! Plain-text bodies for the messages the service sends.

use super::MailMessage;

const PRODUCT_NAME: &str = "Taskhive";

/// Minutes a reset link stays valid; keep in line with the token expiry used by the auth handlers.
pub const RESET_LINK_MINUTES: i64 = 30;

/// Link embedded in the password reset mail.
pub fn reset_link(app_url: &str, token: &str) -> String {
    format!("{}/reset?token={}", app_url.trim_end_matches('/'), token)
}

pub fn password_reset(to: &str, name: Option<&str>, link: &str) -> MailMessage {
    let greeting = name.filter(|n| !n.trim().is_empty()).unwrap_or("there");
    let body = format!(
        "Hello {greeting},\n\n\
         You requested to reset your password for {PRODUCT_NAME}.\n\n\
         Open this link to choose a new password:\n{link}\n\n\
         This link will expire in {RESET_LINK_MINUTES} minutes.\n\
         If you didn't request this, you can safely ignore this email.\n\n\
         - The {PRODUCT_NAME} Team\n"
    );
    MailMessage {
        to: to.to_string(),
        subject: format!("Password Reset - {}", PRODUCT_NAME),
        body,
    }
}

/// Details for a team-lead invitation.
#[derive(Debug, Clone)]
pub struct TeamLeadInvite<'a> {
    pub organization_name: &'a str,
    pub manager_name: &'a str,
    pub login_url: &'a str,
    pub email: &'a str,
    pub temporary_password: &'a str,
}

pub fn team_lead_invite(invite: &TeamLeadInvite<'_>) -> MailMessage {
    let TeamLeadInvite {
        organization_name,
        manager_name,
        login_url,
        email,
        temporary_password,
    } = invite;
    let body = format!(
        "Hello there,\n\n\
         {manager_name} has invited you to join {organization_name} as a Team Lead on {PRODUCT_NAME}.\n\
         Use the credentials below to sign in. We recommend changing your password after your first login.\n\n\
         Login Email: {email}\n\
         Temporary Password: {temporary_password}\n\n\
         Sign in at: {login_url}\n\n\
         If you did not expect this invitation, please reach out to {manager_name}.\n\n\
         - The {PRODUCT_NAME} Team\n"
    );
    MailMessage {
        to: email.to_string(),
        subject: format!("You're invited as Team Lead for {}", organization_name),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_link_joins_without_double_slash() {
        assert_eq!(
            reset_link("http://localhost:3000/", "abc"),
            "http://localhost:3000/reset?token=abc"
        );
    }

    #[test]
    fn reset_mail_contains_link_and_expiry() {
        let link = reset_link("https://app.example.com", "deadbeef");
        let mail = password_reset("ana@example.com", Some("Ana"), &link);
        assert_eq!(mail.to, "ana@example.com");
        assert!(mail.body.starts_with("Hello Ana,"));
        assert!(mail.body.contains("https://app.example.com/reset?token=deadbeef"));
        assert!(mail.body.contains("30 minutes"));
    }

    #[test]
    fn reset_mail_without_name_uses_generic_greeting() {
        let mail = password_reset("x@example.com", Some("  "), "http://l");
        assert!(mail.body.starts_with("Hello there,"));
    }

    #[test]
    fn invite_mail_carries_credentials() {
        let mail = team_lead_invite(&TeamLeadInvite {
            organization_name: "Acme",
            manager_name: "Morgan",
            login_url: "https://app.example.com/login",
            email: "lead@acme.io",
            temporary_password: "Ab3dEf7h",
        });
        assert_eq!(mail.subject, "You're invited as Team Lead for Acme");
        assert_eq!(mail.to, "lead@acme.io");
        assert!(mail.body.contains("Temporary Password: Ab3dEf7h"));
        assert!(mail.body.contains("Morgan has invited you to join Acme"));
    }
}
