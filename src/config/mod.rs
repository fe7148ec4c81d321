pub mod watcher;

pub use watcher::WatcherConfig;
