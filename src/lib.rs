//! meigen: a webhook-driven Discord bot that renders a message written in
//! Discord-flavored markdown into a single quote-card PNG.
//!
//! The crate is layered the usual way: `domain` holds the pure markdown
//! grammar and emoji key derivation, `application` the async document
//! renderer and image compositor, `infra` the HTTP surface, the Discord REST
//! client and the upstream asset fetchers, and `config` the layered runtime
//! settings.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
