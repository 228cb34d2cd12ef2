//! IntelHub - Competitor and sourcing intelligence backend
//!
//! This library provides the core functionality for the IntelHub system:
//! tag resolution and indexing plus the competitor, vendor, wishlist, and
//! master product stores built on top of it.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
