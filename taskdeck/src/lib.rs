//! taskdeck — terminal client for a multi-tenant to-do service.

pub mod api;
pub mod assistant;
pub mod cli;
pub mod commands;
pub mod config;
pub mod session;
pub mod tasks;
