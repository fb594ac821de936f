pub mod agent;
pub mod card;
pub mod config;
pub mod error;
pub mod event;
pub mod session;
pub mod snapshot;
pub mod strategy;
pub mod transport;
