pub mod email;
pub mod status_log;
