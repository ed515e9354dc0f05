//! Terminal browser for saved assistant conversation sessions.

pub mod action;
pub mod app;
pub mod config;
pub mod filter;
pub mod launch;
pub mod layout;
pub mod logging;
pub mod nav;
pub mod session;
pub mod store;
pub mod text;
pub mod ui;
