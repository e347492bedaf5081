//! Client configuration, request overrides, token responses, and credential helpers.

pub mod client_auth;
pub mod config;
pub mod pkce;
pub mod request;
pub mod token;

pub use client_auth::*;
pub use config::*;
pub use pkce::*;
pub use request::*;
pub use token::*;
