// Service exports
pub mod cache;
pub mod gemini;
pub mod memory;
pub mod mock_oracle;
pub mod oracle;
pub mod postgres;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use gemini::GeminiClient;
pub use memory::MemoryStore;
pub use mock_oracle::MockOracle;
pub use oracle::{
    parse_json_object, GenerationOptions, JsonObject, MediaPart, ModelKind, OracleError,
    VisionOracle,
};
pub use postgres::PostgresClient;
pub use store::{
    LostPostingStore, NotificationSink, PetStore, StoreError, Stores, StrayReportStore,
    SwipeStore,
};
