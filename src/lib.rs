pub mod aggregate;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod feed;
pub mod output;
pub mod regions;
pub mod table;
pub mod tui;
