pub mod memory;
pub mod supabase;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryStorage;
pub use supabase::SupabaseStorage;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
