//! Model backend selection and the chat client built from it.

pub mod backend;
pub mod error;
pub mod openai;

pub use backend::{BackendDescriptor, BackendKind, defaults};
pub use error::LlmError;
pub use openai::{ChatModel, OpenAICompatibleModel};
