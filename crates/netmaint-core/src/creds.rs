// Credential sourcing for collection runs.
//
// The collector never reads secrets itself; callers hand it a provider
// and it mints device credentials exactly when a session opens.

use secrecy::SecretString;

use netmaint_rpc::SessionAuth;

use crate::error::CoreError;

/// Credentials for the ticketing endpoint reports can be pushed to.
#[derive(Clone)]
pub struct TicketingCredentials {
    pub url: String,
    pub username: String,
    pub password: SecretString,
}

/// Source of credentials for a collection run.
///
/// `device_auth` must mint a fresh credential on every call: device
/// passwords carry a one-time suffix that a second login cannot reuse.
/// The returned `minted_at` lets the collector pace the next mint past
/// the code's validity window.
pub trait CredentialProvider {
    fn ticketing(&self) -> Result<TicketingCredentials, CoreError>;
    fn device_auth(&self) -> Result<SessionAuth, CoreError>;
}
