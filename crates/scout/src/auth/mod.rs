//! Credential lookup for model backend selection.

pub mod credentials;
pub mod resolver;

pub use credentials::{
    CredentialLookup, CredentialSource, DEFAULT_PLACEHOLDERS, SourceKind, UnavailableReason,
};
pub use resolver::{CredentialResolver, EnvLookup, ResolverConfig};
