pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod geocode;
pub mod memory;
pub mod pages;
pub mod searches;
pub mod state;
