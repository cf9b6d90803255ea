//! Credential encryption at rest.

mod vault;

pub use vault::CredentialVault;
