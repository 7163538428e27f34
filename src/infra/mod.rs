pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod job_queue;
pub mod redis_sink;
pub mod setup;
