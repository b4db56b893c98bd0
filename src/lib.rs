pub mod access;
pub mod catalog;
pub mod config;
pub mod loader;
pub mod storage;
pub mod transaction;
