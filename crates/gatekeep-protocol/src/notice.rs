//! Messages the gate sends to players.
//!
//! Keeping every text in one enum means a host can translate or
//! restyle them by matching on [`Notice`] instead of string-comparing.
//! `Display` gives the default English wording.

use std::fmt;

/// A message shown to a player (or used as a disconnect reason).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    // -- Disconnect reasons ---------------------------------------------
    /// Join refused by the per-second join limiter.
    TooManyJoins,
    /// Join refused: an authenticated player already holds the name.
    AlreadyOnline,
    /// Pre-auth deadline elapsed.
    LoginTimeout,
    /// An older, unauthenticated connection was replaced by a new one.
    Displaced,

    // -- Prompts ---------------------------------------------------------
    PromptLogin,
    PromptRegister,
    /// Any non-identity command while unauthenticated.
    LoginFirst,

    // -- Command outcomes ------------------------------------------------
    RegistrationComplete,
    AlreadyRegistered,
    RegisterUsage,
    LoginSuccessful,
    NotRegistered,
    LoginUsage,
    IncorrectPassword,
    AlreadyLoggedIn,
    SetPasswordUsage,
    PasswordsDoNotMatch,
    PasswordSaved,

    /// The credentials file could not be written; the change is kept in
    /// memory and retried.
    StorageDegraded,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TooManyJoins => "Too many players joining at once. Try again.",
            Self::AlreadyOnline => "That username is already online.",
            Self::LoginTimeout => "You took too long to login.",
            Self::Displaced => "Another connection took over this name before you logged in.",
            Self::PromptLogin => "Please login: /login <password>",
            Self::PromptRegister => "Register: /register <password>",
            Self::LoginFirst => "Login first: /login <password>",
            Self::RegistrationComplete => "Registration complete!",
            Self::AlreadyRegistered => "Already registered. Use /login.",
            Self::RegisterUsage => "Usage: /register <password>",
            Self::LoginSuccessful => "Login successful!",
            Self::NotRegistered => "Not registered. Use /register.",
            Self::LoginUsage => "Usage: /login <password>",
            Self::IncorrectPassword => "Incorrect password!",
            Self::AlreadyLoggedIn => "You are already logged in.",
            Self::SetPasswordUsage => "Usage: /setpassword <password> <confirmPassword>",
            Self::PasswordsDoNotMatch => "Passwords do not match!",
            Self::PasswordSaved => "Password saved!",
            Self::StorageDegraded => {
                "Sorry, your password could not be written to disk yet. It will be retried."
            }
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_display_has_no_formatting_codes() {
        for notice in [Notice::TooManyJoins, Notice::LoginFirst, Notice::StorageDegraded] {
            assert!(!notice.to_string().contains('§'));
        }
    }

    #[test]
    fn test_prompts_mention_their_command() {
        assert!(Notice::PromptLogin.to_string().contains("/login"));
        assert!(Notice::PromptRegister.to_string().contains("/register"));
    }
}
