pub mod arc;
pub mod lfu;
pub mod lru;
pub mod simple;

pub use arc::ArcCache;
pub use lfu::LfuCache;
pub use lru::LruCache;
pub use simple::SimpleCache;
