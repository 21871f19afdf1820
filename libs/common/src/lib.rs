//! Common library for the Underneath Media backend
//!
//! This crate provides the infrastructure shared by the studio's services:
//! PostgreSQL connectivity, schema bootstrap and the database error types.

pub mod database;
pub mod error;
