pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod refresh;
pub mod scheduler;
pub mod storage;
pub mod web;
