#![deny(rust_2018_idioms)]

pub mod actor;
pub mod commands;
pub mod config;
pub mod console;
pub mod permissions;
