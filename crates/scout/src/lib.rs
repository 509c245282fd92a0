//! Scout - the orchestration core of a small research agent.
//!
//! Resolves model credentials, holds a session with the tool gateway, merges
//! remote and local capabilities, and runs the research pipeline.

pub mod auth;
pub mod build_info;
pub mod capability;
pub mod config;
pub mod define;
pub mod gateway;
pub mod llm;
pub mod research;
pub mod sse_parser;
pub mod store;
