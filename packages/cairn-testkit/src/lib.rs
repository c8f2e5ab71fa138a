use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use serde_json::{Map, Value};

use cairn_config::{
	Chunking, Confidence, Config, ContextBudget, EmbeddingProviderConfig, Evaluation,
	GeneratorProviderConfig, Providers as ProviderSettings, Retrieval, Service, Web,
	WebSearchProviderConfig,
};
use cairn_domain::WebHit;
use cairn_service::{
	BoxFuture, CairnService, EmbeddingProvider, GeneratorProvider, Providers, Stores,
	WebSearchProvider,
};
use cairn_storage::{MemoryEvalStore, MemoryStore};

/// Embedding stub: looks texts up in a fixed map, padding every vector to
/// the configured dimensionality so shape checks pass. Unknown texts get the
/// default vector.
pub struct MappedEmbedding {
	pub dimensions: usize,
	pub vectors: HashMap<String, Vec<f32>>,
	pub default: Vec<f32>,
}

pub struct FailingEmbedding {
	pub calls: Arc<AtomicUsize>,
}

pub struct StubGenerator {
	pub answer: String,
	pub calls: Arc<AtomicUsize>,
}

pub struct FailingGenerator;

pub struct StubWebSearch {
	pub hits: Vec<WebHit>,
}

pub struct FailingWebSearch;

impl MappedEmbedding {
	pub fn new(dimensions: usize) -> Self {
		Self { dimensions, vectors: HashMap::new(), default: vec![1.0] }
	}

	pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
		self.vectors.insert(text.to_string(), vector);

		self
	}

	fn embed_one(&self, text: &str) -> Vec<f32> {
		let mut vector = self.vectors.get(text).unwrap_or(&self.default).clone();

		vector.resize(self.dimensions, 0.0);

		vector
	}
}

impl EmbeddingProvider for MappedEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		let vectors = texts.iter().map(|text| self.embed_one(text)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move { Err(color_eyre::eyre::eyre!("Embedding capability is down.")) })
	}
}

impl StubGenerator {
	pub fn new(answer: &str) -> Self {
		Self { answer: answer.to_string(), calls: Arc::new(AtomicUsize::new(0)) }
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl GeneratorProvider for StubGenerator {
	fn generate<'a>(
		&'a self,
		_cfg: &'a GeneratorProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let answer = self.answer.clone();

		Box::pin(async move { Ok(answer) })
	}
}

impl GeneratorProvider for FailingGenerator {
	fn generate<'a>(
		&'a self,
		_cfg: &'a GeneratorProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move { Err(color_eyre::eyre::eyre!("Generation capability is down.")) })
	}
}

impl WebSearchProvider for StubWebSearch {
	fn search<'a>(
		&'a self,
		_cfg: &'a WebSearchProviderConfig,
		_query: &'a str,
		_include_domains: &'a [String],
		max_results: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<WebHit>>> {
		let hits = self.hits.iter().take(max_results as usize).cloned().collect();

		Box::pin(async move { Ok(hits) })
	}
}

impl WebSearchProvider for FailingWebSearch {
	fn search<'a>(
		&'a self,
		_cfg: &'a WebSearchProviderConfig,
		_query: &'a str,
		_include_domains: &'a [String],
		_max_results: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<WebHit>>> {
		Box::pin(async move { Err(color_eyre::eyre::eyre!("Web search capability is down.")) })
	}
}

/// Config with test-friendly defaults: small dimensions, web search off.
pub fn test_config(dimensions: u32) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		chunking: Chunking { chunk_size: 1_000, chunk_overlap: 200, sentence_aware: true },
		retrieval: Retrieval {
			top_k: 10,
			similarity_threshold: 0.7,
			vector_weight: 0.7,
			keyword_weight: 0.3,
			search_timeout_ms: 2_000,
		},
		context: ContextBudget { max_context_chars: 12_000, excerpt_max_chars: 300 },
		confidence: Confidence { retrieval_weight: 0.7, citation_weight: 0.3 },
		web: Web {
			enabled: false,
			max_results: 5,
			startup_domains: vec!["techcrunch.com".to_string()],
			investor_domains: vec!["crunchbase.com".to_string()],
		},
		providers: ProviderSettings {
			embedding: EmbeddingProviderConfig {
				provider_id: "test-embedding".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embed".to_string(),
				dimensions,
				batch_size: 32,
				timeout_ms: 500,
				default_headers: Map::new(),
			},
			generator: GeneratorProviderConfig {
				provider_id: "test-generator".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test-chat".to_string(),
				temperature: 0.2,
				max_tokens: 1_024,
				timeout_ms: 500,
				default_headers: Map::new(),
			},
			web_search: WebSearchProviderConfig {
				provider_id: "test-web".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/search".to_string(),
				timeout_ms: 500,
				default_headers: Map::new(),
			},
		},
		evaluation: Evaluation { enabled: true, log_path: None },
	}
}

/// Service over a shared in-memory store and evaluation log; the handles are
/// returned so tests can seed and inspect them directly.
pub fn build_service(
	cfg: Config,
	providers: Providers,
) -> (CairnService, Arc<MemoryStore>, Arc<MemoryEvalStore>) {
	let store = Arc::new(MemoryStore::new());
	let evaluation = Arc::new(MemoryEvalStore::new());
	let stores = Stores {
		vector: store.clone(),
		keyword: store.clone(),
		chunks: store.clone(),
		evaluation: evaluation.clone(),
	};
	let service = CairnService::with_providers(cfg, stores, providers);

	(service, store, evaluation)
}
