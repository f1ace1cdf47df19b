pub mod api;
pub mod config;
pub mod controller;
pub mod domain;
pub mod logs;
pub mod pipeline;
pub mod poller;
pub mod terminal;
