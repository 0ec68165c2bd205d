pub mod app;
pub mod cache;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod describe;
pub mod domain;
pub mod error;
mod flight;
pub mod index;
pub mod output;
pub mod query;
pub mod reconcile;
