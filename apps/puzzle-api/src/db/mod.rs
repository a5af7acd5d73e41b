pub mod pg;
pub mod pool;
pub mod schema;
pub mod store;

pub use pg::PgPuzzleStore;
pub use store::{MemoryPuzzleStore, PuzzleStore};
