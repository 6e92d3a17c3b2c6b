#![allow(async_fn_in_trait)]

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod entities;
pub mod error;
pub mod utils;
