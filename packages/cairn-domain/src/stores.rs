use std::{future::Future, pin::Pin};

use uuid::Uuid;

use crate::types::{Chunk, ChunkHit, Collection, QueryFilters, QueryLog};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("{message}")]
	Unavailable { message: String },
	#[error("{message}")]
	Backend { message: String },
}

/// Dense-vector nearest-neighbor search over stored chunks.
pub trait VectorSearch
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		embedding: &'a [f32],
		top_k: u32,
		collections: &'a [Collection],
		filters: &'a QueryFilters,
	) -> BoxFuture<'a, StoreResult<Vec<ChunkHit>>>;
}

/// Lexical keyword search over stored chunks.
pub trait KeywordSearch
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		text: &'a str,
		top_k: u32,
		collections: &'a [Collection],
		filters: &'a QueryFilters,
	) -> BoxFuture<'a, StoreResult<Vec<ChunkHit>>>;
}

/// Chunk persistence. Writers must never expose a partial chunk set to
/// concurrent readers.
pub trait ChunkStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, chunk_id: Uuid) -> BoxFuture<'a, StoreResult<Option<Chunk>>>;

	fn put<'a>(&'a self, chunks: Vec<Chunk>) -> BoxFuture<'a, StoreResult<()>>;

	fn source_exists<'a>(&'a self, source_id: &'a str) -> BoxFuture<'a, StoreResult<bool>>;
}

/// Append-only query-metrics log.
pub trait EvaluationStore
where
	Self: Send + Sync,
{
	fn append<'a>(&'a self, record: QueryLog) -> BoxFuture<'a, StoreResult<()>>;

	/// Most recent records, oldest first; `window` limits to the last N.
	fn query<'a>(&'a self, window: Option<usize>) -> BoxFuture<'a, StoreResult<Vec<QueryLog>>>;
}
