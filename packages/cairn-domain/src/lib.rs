pub mod citation;
pub mod confidence;
pub mod language;
pub mod stores;
pub mod time_serde;
pub mod types;

pub use citation::{CitationBinding, bind_citations, excerpt_of, extract_markers};
pub use confidence::confidence_score;
pub use stores::{
	BoxFuture, ChunkStore, EvaluationStore, KeywordSearch, StoreError, StoreResult, VectorSearch,
};
pub use types::{
	Candidate, Chunk, ChunkHit, Citation, Collection, EntityRefs, Origin, QueryFilters, QueryLog,
	QueryType, SearchMetadata, SearchMode, SearchResult, SourceMap, WebHit,
};
