// src/lib.rs

pub mod app_state;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod range;
pub mod storage;
