pub mod eval_log;
pub mod memory;

pub use eval_log::{JsonlEvalStore, MemoryEvalStore};
pub use memory::{MemoryStore, cosine_similarity};
