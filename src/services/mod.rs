//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on request parsing, auth plumbing, and mapping
//! service errors to status codes.

pub mod account;
pub mod category;
pub mod domain;
pub mod faq;
pub mod public_site;
pub mod session;
pub mod site;
pub mod storage;
pub mod theme;
