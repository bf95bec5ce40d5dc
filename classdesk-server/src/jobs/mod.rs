//! Scheduled jobs run by the CLI

pub mod heartbeat;
