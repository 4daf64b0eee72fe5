//! Wire protocol for the polygon editor's two external services: the WMS
//! map service (feature-info lookups, tile parameters) and the polygon store.

pub mod backend;
pub mod cache_buster;
pub mod wms;

pub use backend::*;
pub use cache_buster::*;
pub use wms::*;
