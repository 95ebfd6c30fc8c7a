//! Authentication
//!
//! Sign-in and sign-up against an external identity provider, with form
//! validation and the messages shown for each outcome.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tracing::{info, warn};

use crate::navigation::Screen;

/// Errors reported by an identity provider.
#[derive(Debug, Error, PartialEq)]
pub enum ProviderError {
    /// An account already exists for the email address.
    #[error("email already in use")]
    EmailInUse,

    /// The email/password pair was not accepted.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Any other provider failure.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// User-facing authentication errors.
#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    /// Sign-up password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Sign-up with an email that is already registered.
    #[error("A user with this email already exists.")]
    AlreadyExists,

    /// Sign-up failed for any other reason.
    #[error("Signup failed. Please try again.")]
    SignUpFailed,

    /// Sign-in failed.
    #[error("Invalid email or password.")]
    InvalidCredentials,
}

/// Email and password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Display name
    pub name: String,

    /// Login credentials
    pub credentials: Credentials,
}

/// Sign-up form as entered.
#[derive(Clone, Default)]
pub struct SignUpForm {
    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Password
    pub password: String,

    /// Password, repeated
    pub confirm_password: String,
}

impl fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl SignUpForm {
    /// Check the form and produce the account to register.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PasswordMismatch`] if the passwords differ.
    pub fn validate(self) -> Result<NewAccount, AuthError> {
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        Ok(NewAccount {
            name: self.name.trim().to_string(),
            credentials: Credentials {
                email: self.email.trim().to_string(),
                password: self.password,
            },
        })
    }
}

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Display name, if set
    pub name: Option<String>,

    /// Email address
    pub email: String,
}

/// External identity provider.
#[automock]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Authenticate an existing account.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Account, ProviderError>;

    /// Register an account.
    async fn sign_up(&self, account: &NewAccount) -> Result<Account, ProviderError>;
}

/// Sign in and return the account plus the screen to show next.
///
/// # Errors
///
/// Any provider failure is reported as [`AuthError::InvalidCredentials`].
pub async fn sign_in<P>(
    provider: &P,
    credentials: &Credentials,
) -> Result<(Account, Screen), AuthError>
where
    P: AuthProvider + ?Sized,
{
    match provider.sign_in(credentials).await {
        Ok(account) => {
            info!(email = %account.email, "signed in");

            Ok((account, Screen::Home))
        }
        Err(error) => {
            warn!(%error, "sign in failed");

            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Validate the form, register the account, and return the screen to show next.
///
/// The provider is not called when the form is invalid.
///
/// # Errors
///
/// Returns [`AuthError::PasswordMismatch`], [`AuthError::AlreadyExists`], or
/// [`AuthError::SignUpFailed`].
pub async fn sign_up<P>(provider: &P, form: SignUpForm) -> Result<Screen, AuthError>
where
    P: AuthProvider + ?Sized,
{
    let account = form.validate()?;

    match provider.sign_up(&account).await {
        Ok(created) => {
            info!(email = %created.email, "signed up");

            Ok(Screen::Login)
        }
        Err(ProviderError::EmailInUse) => Err(AuthError::AlreadyExists),
        Err(error) => {
            warn!(%error, "sign up failed");

            Err(AuthError::SignUpFailed)
        }
    }
}

/// Sign out; the login screen is shown next.
pub fn sign_out() -> Screen {
    info!("signed out");

    Screen::Login
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn form(password: &str, confirm: &str) -> SignUpForm {
        SignUpForm {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "asha@example.com".to_string(),
            password: "hunter22".to_string(),
        }
    }

    #[tokio::test]
    async fn mismatched_passwords_never_reach_provider() {
        let mut provider = MockAuthProvider::new();

        provider.expect_sign_up().never();

        let result = sign_up(&provider, form("one", "two")).await;

        assert_eq!(result, Err(AuthError::PasswordMismatch));
        assert_eq!(
            AuthError::PasswordMismatch.to_string(),
            "Passwords do not match"
        );
    }

    #[tokio::test]
    async fn successful_sign_up_goes_to_login() -> TestResult {
        let mut provider = MockAuthProvider::new();

        provider.expect_sign_up().times(1).returning(|account| {
            Ok(Account {
                name: Some(account.name.clone()),
                email: account.credentials.email.clone(),
            })
        });

        let screen = sign_up(&provider, form("secret", "secret")).await?;

        assert_eq!(screen, Screen::Login);

        Ok(())
    }

    #[tokio::test]
    async fn existing_email_is_reported() {
        let mut provider = MockAuthProvider::new();

        provider
            .expect_sign_up()
            .times(1)
            .returning(|_| Err(ProviderError::EmailInUse));

        let result = sign_up(&provider, form("secret", "secret")).await;

        assert_eq!(result, Err(AuthError::AlreadyExists));
    }

    #[tokio::test]
    async fn other_sign_up_failures_are_generic() {
        let mut provider = MockAuthProvider::new();

        provider
            .expect_sign_up()
            .times(1)
            .returning(|_| Err(ProviderError::Unavailable("timeout".to_string())));

        let result = sign_up(&provider, form("secret", "secret")).await;

        assert_eq!(
            result.map_err(|error| error.to_string()),
            Err("Signup failed. Please try again.".to_string())
        );
    }

    #[tokio::test]
    async fn sign_in_goes_home() -> TestResult {
        let mut provider = MockAuthProvider::new();

        provider.expect_sign_in().times(1).returning(|credentials| {
            Ok(Account {
                name: None,
                email: credentials.email.clone(),
            })
        });

        let (account, screen) = sign_in(&provider, &credentials()).await?;

        assert_eq!(account.email, "asha@example.com");
        assert_eq!(screen, Screen::Home);

        Ok(())
    }

    #[tokio::test]
    async fn failed_sign_in_is_invalid_credentials() {
        let mut provider = MockAuthProvider::new();

        provider
            .expect_sign_in()
            .times(1)
            .returning(|_| Err(ProviderError::Unavailable("offline".to_string())));

        let result = sign_in(&provider, &credentials()).await;

        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[test]
    fn password_is_not_logged() {
        let rendered = format!("{:?}", credentials());

        assert!(!rendered.contains("hunter22"));
    }

    #[test]
    fn sign_out_shows_login() {
        assert_eq!(sign_out(), Screen::Login);
    }
}
