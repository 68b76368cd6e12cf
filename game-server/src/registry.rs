//! The module loader surface: a fixed, deterministically ordered list of
//! compiled-in game modules, built once at startup. `module-index` on the
//! wire is simply the position of a factory in this list.
//!
//! This stands in for a dynamic, packaged-artifact loader, which this
//! repository does not implement.

use std::sync::Arc;

use module::ModuleFactory;

pub fn build_registry() -> Vec<Arc<dyn ModuleFactory>> {
    vec![Arc::new(rummy::RummyFactory)]
}
