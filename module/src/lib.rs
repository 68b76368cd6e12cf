//! The module contract: the interface between the engine core and
//! pluggable game rule sets.

pub mod messages;
pub mod module_trait;

pub use messages::{Availability, EngMsg, GractBundle, ModMsg};
pub use module_trait::{Module, ModuleFactory};
