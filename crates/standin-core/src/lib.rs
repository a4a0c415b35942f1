//! Core types and the matching engine for Standin.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage layer, notification transport, and calendar provider are reached
//! through the traits in [`store`] and [`notify`]; everything else (attribute
//! resolution, constraint evaluation, scoring, ranking, and the job lifecycle)
//! lives here.

pub mod attribute;
pub mod authoring;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod job;
pub mod meeting;
pub mod notify;
pub mod service;
pub mod setting;
pub mod store;
pub mod user;

pub use error::{Error, Result};
