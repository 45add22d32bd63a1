pub mod cache;
pub mod cli;
pub mod command;
pub mod config;
pub mod db;
pub mod domain;
