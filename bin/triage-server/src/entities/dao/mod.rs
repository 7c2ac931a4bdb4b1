//! Plain record structs mirroring the database tables.

pub mod case;
pub mod chat;
pub mod config;
pub mod user;

pub use case::CaseRecord;
pub use chat::{ChatGroupRecord, ChatRecord, MessageRecord};
pub use config::{
    ChunkConfigRecord, EmbeddingConfigRecord, ModelConfigRecord, ParserConfigRecord,
    RagPipelineRecord, RerankerConfigRecord, VectorDbConfigRecord,
};
pub use user::{UserGroupRecord, UserRecord};
