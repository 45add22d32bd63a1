mod dispatcher;
mod invalidator;

pub use dispatcher::{EventDispatcher, FlushAllCaches};
pub use invalidator::{CacheInvalidator, TableCacheInvalidator};
