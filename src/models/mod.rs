//! Data models for the pension fund API.
//!
//! This module contains the data structures exchanged with the remote API:
//!
//! - `UserProfile`, `LoginCredentials`: authentication types
//! - `Noticia`: published news items
//! - `Documento`: transparency documents (PDF attachments with metadata)

pub mod content;
pub mod user;

pub use content::{Documento, Noticia};
pub use user::{LoginCredentials, UserProfile};
