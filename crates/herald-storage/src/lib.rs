pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::StorageError;
pub use memory::{MemoryRecordStore, MemoryScheduleStore, MemoryTemplateStore};
pub use traits::{
    DynRecordStore, DynScheduleStore, DynTemplateStore, RecordStore, ScheduleStore, TemplateStore,
};
pub use types::ScheduledNotification;
