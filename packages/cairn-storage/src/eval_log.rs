use std::path::{Path, PathBuf};

use tokio::{
	fs::{self, OpenOptions},
	io::AsyncWriteExt,
	sync::Mutex,
};

use cairn_domain::{BoxFuture, EvaluationStore, QueryLog, StoreError, StoreResult};

/// Append-only JSON-lines evaluation log on disk. Appends are serialized
/// behind a mutex so concurrent queries never interleave partial lines.
pub struct JsonlEvalStore {
	path: PathBuf,
	write_lock: Mutex<()>,
}

impl JsonlEvalStore {
	pub async fn create(path: impl Into<PathBuf>) -> StoreResult<Self> {
		let path = path.into();

		if let Some(parent) = path.parent()
			&& !parent.as_os_str().is_empty()
		{
			fs::create_dir_all(parent).await.map_err(|err| StoreError::Backend {
				message: format!("Failed to create evaluation log directory: {err}"),
			})?;
		}

		Ok(Self { path, write_lock: Mutex::new(()) })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl EvaluationStore for JsonlEvalStore {
	fn append<'a>(&'a self, record: QueryLog) -> BoxFuture<'a, StoreResult<()>> {
		Box::pin(async move {
			let mut line = serde_json::to_string(&record).map_err(|err| StoreError::Backend {
				message: format!("Failed to encode evaluation record: {err}"),
			})?;

			line.push('\n');

			let _guard = self.write_lock.lock().await;
			let mut file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(&self.path)
				.await
				.map_err(|err| StoreError::Backend {
					message: format!("Failed to open evaluation log: {err}"),
				})?;

			file.write_all(line.as_bytes()).await.map_err(|err| StoreError::Backend {
				message: format!("Failed to append evaluation record: {err}"),
			})?;

			Ok(())
		})
	}

	fn query<'a>(&'a self, window: Option<usize>) -> BoxFuture<'a, StoreResult<Vec<QueryLog>>> {
		Box::pin(async move {
			let raw = match fs::read_to_string(&self.path).await {
				Ok(raw) => raw,
				Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
				Err(err) => {
					return Err(StoreError::Backend {
						message: format!("Failed to read evaluation log: {err}"),
					});
				},
			};
			let mut records = Vec::new();

			for line in raw.lines() {
				if line.trim().is_empty() {
					continue;
				}
				match serde_json::from_str::<QueryLog>(line) {
					Ok(record) => records.push(record),
					Err(err) => {
						tracing::warn!(error = %err, "Skipping malformed evaluation record.");
					},
				}
			}

			if let Some(window) = window
				&& records.len() > window
			{
				records.drain(..records.len() - window);
			}

			Ok(records)
		})
	}
}

/// In-memory evaluation log for tests and log-less deployments.
#[derive(Default)]
pub struct MemoryEvalStore {
	records: tokio::sync::RwLock<Vec<QueryLog>>,
}

impl MemoryEvalStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl EvaluationStore for MemoryEvalStore {
	fn append<'a>(&'a self, record: QueryLog) -> BoxFuture<'a, StoreResult<()>> {
		Box::pin(async move {
			self.records.write().await.push(record);

			Ok(())
		})
	}

	fn query<'a>(&'a self, window: Option<usize>) -> BoxFuture<'a, StoreResult<Vec<QueryLog>>> {
		Box::pin(async move {
			let records = self.records.read().await;
			let skip = window.map(|window| records.len().saturating_sub(window)).unwrap_or(0);

			Ok(records[skip..].to_vec())
		})
	}
}
