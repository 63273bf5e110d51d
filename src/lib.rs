pub mod authorization;
pub mod backend;
pub mod chatbot;
pub mod config;
pub mod consts;
pub mod db;
pub mod models;
pub mod risk;
pub mod services;
pub mod upstream;
pub mod utils;

#[cfg(test)]
mod testing;
