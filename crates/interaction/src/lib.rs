//! Editing interaction for the polygon layer.
//!
//! [`InteractionMachine`] owns the scratch overlay and decides, for every
//! operator gesture or request response, which mode the editor is in and
//! which requests go out next. It performs no I/O itself.

pub mod color;
pub mod effect;
pub mod error;
pub mod event;
pub mod machine;
pub mod notice;
pub mod overlay;

pub use color::*;
pub use effect::*;
pub use error::*;
pub use event::*;
pub use machine::*;
pub use notice::*;
pub use overlay::*;
