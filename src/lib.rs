//! Car imagery generation core
//!
//! This library provides the per-user session state store that carries a
//! user through the upload → preview → generate → download workflow, and the
//! orchestrator that runs image generation jobs on a remote inference
//! provider under a bounded polling budget.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
