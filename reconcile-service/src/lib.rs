pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod spreadsheet;
pub mod startup;
pub mod utils;
