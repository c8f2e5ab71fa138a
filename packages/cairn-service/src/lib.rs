pub mod context;
pub mod embed;
pub mod evaluation;
pub mod ingest;
pub mod retrieval;
pub mod search;
pub mod web;

use std::sync::Arc;

use serde_json::Value;

use cairn_config::{
	Config, EmbeddingProviderConfig, GeneratorProviderConfig, WebSearchProviderConfig,
};
pub use cairn_domain::BoxFuture;
use cairn_domain::{ChunkStore, EvaluationStore, KeywordSearch, StoreError, VectorSearch, WebHit};
use cairn_providers::{embedding, generator, websearch};

pub use evaluation::AggregateMetrics;
pub use ingest::{DocumentMetadata, IngestRequest, IngestResponse, IngestStatus};
pub use search::SearchRequest;

pub type ServiceResult<T> = Result<T, ServiceError>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait GeneratorProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a GeneratorProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub trait WebSearchProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a WebSearchProviderConfig,
		query: &'a str,
		include_domains: &'a [String],
		max_results: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<WebHit>>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	Retrieval { message: String },
	Generation { message: String },
	Provider { message: String },
	Storage { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generator: Arc<dyn GeneratorProvider>,
	pub web_search: Arc<dyn WebSearchProvider>,
}

#[derive(Clone)]
pub struct Stores {
	pub vector: Arc<dyn VectorSearch>,
	pub keyword: Arc<dyn KeywordSearch>,
	pub chunks: Arc<dyn ChunkStore>,
	pub evaluation: Arc<dyn EvaluationStore>,
}

pub struct CairnService {
	pub cfg: Config,
	pub stores: Stores,
	pub providers: Providers,
}

struct DefaultProviders;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Retrieval { message } => write!(f, "Retrieval error: {message}"),
			Self::Generation { message } => write!(f, "Generation error: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<StoreError> for ServiceError {
	fn from(err: StoreError) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl GeneratorProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a GeneratorProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generator::generate(cfg, messages))
	}
}

impl WebSearchProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a WebSearchProviderConfig,
		query: &'a str,
		include_domains: &'a [String],
		max_results: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<WebHit>>> {
		Box::pin(websearch::search(cfg, query, include_domains, max_results))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generator: Arc<dyn GeneratorProvider>,
		web_search: Arc<dyn WebSearchProvider>,
	) -> Self {
		Self { embedding, generator, web_search }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { embedding: provider.clone(), generator: provider.clone(), web_search: provider }
	}
}

impl CairnService {
	pub fn new(cfg: Config, stores: Stores) -> Self {
		Self { cfg, stores, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, stores: Stores, providers: Providers) -> Self {
		Self { cfg, stores, providers }
	}
}
