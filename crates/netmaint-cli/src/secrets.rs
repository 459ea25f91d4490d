//! Keyring-backed credential vault.
//!
//! Everything sensitive lives in the platform secret store under the
//! `netmaint` service, one entry per account. The vault loads all five
//! entries up front, so a run never starts on partial credentials.

use std::time::Instant;

use secrecy::{ExposeSecret, SecretString};
use totp_rs::{Algorithm, Secret, TOTP};

use netmaint_core::{CoreError, CredentialProvider, SessionAuth, TicketingCredentials};

use crate::cli::SecretName;
use crate::error::CliError;

/// Keyring service name for every netmaint entry.
pub const SERVICE: &str = "netmaint";

// ── Keyring access ───────────────────────────────────────────────────

/// Read one account, distinguishing "not stored" from "store broken".
pub fn read_secret(name: SecretName) -> Result<String, CliError> {
    let account = name.account();
    let entry = keyring::Entry::new(SERVICE, account).map_err(|e| CliError::Keyring {
        account: account.into(),
        reason: e.to_string(),
    })?;
    match entry.get_password() {
        Ok(value) => Ok(value),
        Err(keyring::Error::NoEntry) => Err(CliError::MissingSecret {
            account: account.into(),
        }),
        Err(e) => Err(CliError::Keyring {
            account: account.into(),
            reason: e.to_string(),
        }),
    }
}

/// Write one account.
pub fn store_secret(name: SecretName, value: &str) -> Result<(), CliError> {
    let account = name.account();
    let entry = keyring::Entry::new(SERVICE, account).map_err(|e| CliError::Keyring {
        account: account.into(),
        reason: e.to_string(),
    })?;
    entry.set_password(value).map_err(|e| CliError::Keyring {
        account: account.into(),
        reason: e.to_string(),
    })?;
    Ok(())
}

// ── Vault ────────────────────────────────────────────────────────────

/// Fully-loaded credential set.
pub struct KeyringVault {
    primary_user: String,
    primary_password: SecretString,
    ticket_url: String,
    mfa_password: SecretString,
    totp: TOTP,
}

impl KeyringVault {
    /// Load every account from the keyring. Any missing entry is fatal.
    pub fn load() -> Result<Self, CliError> {
        let primary_user = read_secret(SecretName::PrimaryUser)?;
        let primary_password = SecretString::from(read_secret(SecretName::PrimaryPassword)?);
        let ticket_url = read_secret(SecretName::TicketUrl)?;
        let mfa_password = SecretString::from(read_secret(SecretName::MfaPassword)?);
        let totp = totp_from_seed(&read_secret(SecretName::OtpSeed)?)?;

        Ok(Self {
            primary_user,
            primary_password,
            ticket_url,
            mfa_password,
            totp,
        })
    }

    /// Device login user: the primary user with the gateway's MFA suffix.
    fn mfa_user(&self) -> String {
        format!("{}mfa", self.primary_user)
    }
}

/// Build the 30-second SHA-1 six-digit generator the gateways expect.
fn totp_from_seed(seed: &str) -> Result<TOTP, CliError> {
    let bytes = Secret::Encoded(seed.trim().to_owned())
        .to_bytes()
        .map_err(|e| CliError::Credential {
            message: format!("otp-seed is not base32: {e:?}"),
        })?;
    TOTP::new(Algorithm::SHA1, 6, 1, 30, bytes).map_err(|e| CliError::Credential {
        message: format!("otp-seed rejected: {e:?}"),
    })
}

impl CredentialProvider for KeyringVault {
    fn ticketing(&self) -> Result<TicketingCredentials, CoreError> {
        Ok(TicketingCredentials {
            url: self.ticket_url.clone(),
            username: self.primary_user.clone(),
            password: self.primary_password.clone(),
        })
    }

    fn device_auth(&self) -> Result<SessionAuth, CoreError> {
        // Always the code current at call time; nothing caches it.
        let code = self
            .totp
            .generate_current()
            .map_err(|e| CoreError::Credentials {
                message: format!("one-time code generation failed: {e}"),
            })?;
        Ok(SessionAuth {
            username: self.mfa_user(),
            password: SecretString::from(format!("{}{code}", self.mfa_password.expose_secret())),
            minted_at: Instant::now(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // 20 bytes once decoded; the generator rejects seeds under 128 bits.
    const SEED: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";

    fn vault() -> KeyringVault {
        KeyringVault {
            primary_user: "svc-netmaint".into(),
            primary_password: SecretString::from("pw"),
            ticket_url: "https://tickets.example.net".into(),
            mfa_password: SecretString::from("hunter2"),
            totp: totp_from_seed(SEED).unwrap(),
        }
    }

    #[test]
    fn test_totp_seed_accepts_base32() {
        let totp = totp_from_seed(SEED).unwrap();
        let code = totp.generate_current().unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_totp_seed_rejects_garbage() {
        assert!(totp_from_seed("not base32!!").is_err());
    }

    #[test]
    fn test_device_auth_appends_fresh_code() {
        let auth = vault().device_auth().unwrap();
        assert_eq!(auth.username, "svc-netmaintmfa");

        let password = auth.password.expose_secret();
        assert!(password.starts_with("hunter2"));
        let code = &password["hunter2".len()..];
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_ticketing_uses_primary_identity() {
        let creds = vault().ticketing().unwrap();
        assert_eq!(creds.username, "svc-netmaint");
        assert_eq!(creds.url, "https://tickets.example.net");
    }
}
