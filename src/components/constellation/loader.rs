//! Fetching and decoding `projects.json`.

use log::warn;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::config::ConstellationConfig;
use super::types::ProjectRecord;

#[derive(Debug, Error)]
pub enum LoadError {
	#[error("fetch failed: {0}")]
	Fetch(String),
	#[error("server responded with HTTP {0}")]
	Status(u16),
	#[error("invalid project document: {0}")]
	Decode(#[from] serde_json::Error),
	#[error("project document has no `projects` array")]
	MissingProjects,
}

impl From<JsValue> for LoadError {
	fn from(value: JsValue) -> Self {
		LoadError::Fetch(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}

/// The decoded document: the project list and optional engine overrides.
#[derive(Clone, Debug, Default)]
pub struct ProjectsDocument {
	pub projects: Vec<ProjectRecord>,
	pub settings: Option<ConstellationConfig>,
}

/// Decodes a projects document. Records are decoded one at a time so a single
/// malformed entry is dropped with a warning instead of failing the whole list.
pub fn decode_document(text: &str) -> Result<ProjectsDocument, LoadError> {
	let document: Value = serde_json::from_str(text)?;
	let entries = document
		.get("projects")
		.and_then(Value::as_array)
		.ok_or(LoadError::MissingProjects)?;

	let projects = entries
		.iter()
		.enumerate()
		.filter_map(|(index, entry)| match ProjectRecord::deserialize(entry) {
			Ok(record) if record.id.trim().is_empty() => {
				warn!("project #{index} has an empty id; skipped");
				None
			}
			Ok(record) => Some(record),
			Err(err) => {
				warn!("project #{index} is malformed: {err}");
				None
			}
		})
		.collect();

	let settings = document
		.get("settings")
		.and_then(|settings| match ConstellationConfig::deserialize(settings) {
			Ok(config) => Some(config),
			Err(err) => {
				warn!("ignoring invalid settings: {err}");
				None
			}
		});

	Ok(ProjectsDocument { projects, settings })
}

pub async fn fetch_projects(url: &str) -> Result<ProjectsDocument, LoadError> {
	let opts = RequestInit::new();
	opts.set_method("GET");
	let request = Request::new_with_str_and_init(url, &opts)?;

	let window = web_sys::window().ok_or_else(|| LoadError::Fetch("no window".into()))?;
	let response: Response = JsFuture::from(window.fetch_with_request(&request))
		.await?
		.dyn_into()?;
	if !response.ok() {
		return Err(LoadError::Status(response.status()));
	}

	let body = JsFuture::from(response.text()?).await?;
	let text = body
		.as_string()
		.ok_or_else(|| LoadError::Fetch("response body is not text".into()))?;
	decode_document(&text)
}
