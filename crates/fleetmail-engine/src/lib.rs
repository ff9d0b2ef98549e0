pub mod account;
pub mod config;
pub mod context;
pub mod control_plane;
pub mod conversations;
pub mod fleet;
pub mod invites;
pub mod logging;
pub mod platform;
pub mod poller;
pub mod rate_model;
pub mod resolver;
pub mod retry_queue;
pub mod rotator;
pub mod scheduler;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;
