// src/lib.rs

//! Realty listings watcher with Telegram notifications

pub mod context;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod telegram;
pub mod utils;
