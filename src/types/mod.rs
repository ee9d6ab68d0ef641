//! Tipos compartilhados do gitcache.

pub mod config;
pub mod errors;
pub mod requests;
pub mod responses;
