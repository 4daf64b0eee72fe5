//! Async shell around the interaction state machine.
//!
//! The state machine decides; this crate performs the I/O it asks for
//! (feature-info lookups against the WMS service, mutations against the
//! polygon store, tile cache busting) and feeds the outcomes back.

use std::future::Future;
use std::pin::Pin;

pub mod config;
pub mod console;
pub mod error;
pub mod gateway;
pub mod query;
pub mod session;

pub use config::EditorConfig;
pub use error::GatewayError;
pub use gateway::{FeatureStore, HttpFeatureStore, PersistenceGateway};
pub use query::{FeatureInfoSource, WmsFeatureInfo};
pub use session::Session;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
