mod in_memory;

pub use in_memory::InMemoryCache;

// Re-export the cache trait from core so consumers need only this crate.
pub use marketpulse_core::AnalysisCache;
