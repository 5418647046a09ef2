pub mod api;
pub mod config;
pub mod db;
pub mod generator;
pub mod integrations;
pub mod models;
pub mod pipeline;
pub mod refine;
pub mod store;
pub mod workflow;
