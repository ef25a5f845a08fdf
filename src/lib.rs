//! Quill - content query and moderation engine for a blogging backend
//!
//! This library provides post listing and retrieval, threaded comments with
//! moderation, ownership-based authorization and aggregate statistics over
//! SQLite or MySQL storage.

pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
