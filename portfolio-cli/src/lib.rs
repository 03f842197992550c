//! Portfolio register import engine and CLI
//!
//! The heart of the crate is [`import`]: an Excel ingestion pipeline that
//! normalizes human-maintained project registers into the schema owned by
//! [`config::repository`]. The CLI in [`cli`] is a thin reporting layer.

pub mod cli;
pub mod config;
pub mod import;
