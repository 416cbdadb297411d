pub mod backend;
pub mod memory;
pub mod schema;
pub mod sqlite;

pub use backend::{PersistenceBackend, StorageResult};
pub use memory::MemoryPersistenceBackend;
pub use schema::{ExecutionRow, ExecutionStatusRow, JobType, PipelineRow, ScheduledJobRow};
pub use sqlite::{SqliteBackend, SqlitePoolConfig};
