pub mod audit;
pub mod collection;
pub mod config;
pub mod error;
pub mod event;
pub mod hook_event;
pub mod id;
pub mod record;
pub mod store;
