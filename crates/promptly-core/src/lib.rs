//! Promptly Core Types and Traits
//!
//! This crate provides the fundamental types and traits used throughout Promptly:
//! - Domain models (profiles, personas, templates, prompts, users)
//! - Activity telemetry records
//! - Capability traits for durable storage and navigation
//! - The observable state container and the event bus
//! - Client configuration and core error types

pub mod activity;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod models;
pub mod navigation;
pub mod observable;
pub mod storage;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use event_bus::{BusEvent, EventBus};
pub use navigation::{LoggingNavigator, Navigator};
pub use observable::{Observable, Subscription};
pub use storage::{KeyValueStore, MemoryKeyValueStore};
