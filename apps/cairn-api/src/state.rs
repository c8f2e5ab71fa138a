use std::sync::Arc;

use cairn_domain::EvaluationStore;
use cairn_service::{CairnService, Stores};
use cairn_storage::{JsonlEvalStore, MemoryEvalStore, MemoryStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<CairnService>,
}
impl AppState {
	pub async fn new(config: cairn_config::Config) -> color_eyre::Result<Self> {
		let store = Arc::new(MemoryStore::new());
		let evaluation: Arc<dyn EvaluationStore> = match config.evaluation.log_path.as_deref() {
			Some(path) => Arc::new(
				JsonlEvalStore::create(path)
					.await
					.map_err(|err| color_eyre::eyre::eyre!(err.to_string()))?,
			),
			None => Arc::new(MemoryEvalStore::new()),
		};
		let stores = Stores {
			vector: store.clone(),
			keyword: store.clone(),
			chunks: store,
			evaluation,
		};
		let service = CairnService::new(config, stores);

		Ok(Self { service: Arc::new(service) })
	}
}
