pub mod api;
pub mod db;
pub mod error;
pub mod grid;
pub mod models;
pub mod records;
pub mod services;
pub mod state;
