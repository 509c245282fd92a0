//! Connection to the external tool gateway.

pub mod error;
pub mod session;
pub mod sse;
pub mod transport;

pub use error::GatewayError;
pub use session::{
    GatewaySession, SessionState, SessionTimeouts, with_optional_session, with_session,
};
pub use sse::SseConnector;
pub use transport::{GatewayConnection, GatewayConnector};
