// src/lib.rs

//! Resource publisher library
//!
//! Copies files from a source storage into a web-reachable target storage
//! and hands out their public URLs.

pub mod config;
pub mod error;
pub mod models;
pub mod publisher;
pub mod storage;
pub mod utils;
