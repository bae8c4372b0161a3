mod cache;
mod session;
pub mod store;

pub use cache::CacheGateway;
pub use session::DEFAULT_ATTEMPT_TTL_MINUTES;
pub use session::FlowStage;
pub use session::Session;
pub use session::Visibility;
pub use store::FileFlowStore;
pub use store::FlowStore;
pub use store::MemoryFlowStore;
