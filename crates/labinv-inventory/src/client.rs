// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP client for the inventory backend.
//!
//! Every operation goes to one endpoint selected by `?action=`. Reads are
//! GETs and may be retried; writes are POSTs with a JSON body and are sent
//! exactly once.

use std::sync::Arc;

use async_trait::async_trait;
use labinv_common_http::{new_client_with_jar, retry, ClientOptions, RetryConfig};
use labinv_common_secret::SecretString;
use reqwest::cookie::{CookieStore, Jar};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{
	ApiAction, CreatedEquipment, Credentials, InventoryApi, Registration, SessionApi, SessionStatus,
	SessionUser,
};
use crate::error::ApiError;
use crate::model::{Equipment, EquipmentId, EquipmentPatch, NewEquipment};

pub struct HttpInventoryClient {
	endpoint: Url,
	http: reqwest::Client,
	jar: Arc<Jar>,
	read_retry: RetryConfig,
}

impl HttpInventoryClient {
	pub fn new(endpoint: Url, options: &ClientOptions) -> Result<Self, ApiError> {
		if endpoint.cannot_be_a_base() {
			return Err(ApiError::InvalidUrl(endpoint.to_string()));
		}
		let jar = Arc::new(Jar::default());
		let http = new_client_with_jar(Arc::clone(&jar), options)
			.map_err(|e| ApiError::ClientBuild(e.to_string()))?;
		Ok(Self {
			endpoint,
			http,
			jar,
			read_retry: RetryConfig::default(),
		})
	}

	/// Joins the server base URL and the endpoint script name.
	pub fn from_base(base_url: &Url, endpoint: &str, options: &ClientOptions) -> Result<Self, ApiError> {
		let endpoint = base_url
			.join(endpoint)
			.map_err(|e| ApiError::InvalidUrl(format!("{base_url} + {endpoint}: {e}")))?;
		Self::new(endpoint, options)
	}

	pub fn with_read_retry(mut self, config: RetryConfig) -> Self {
		self.read_retry = config;
		self
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Loads a previously exported `Cookie` header into the jar.
	pub fn restore_session(&self, cookie: &SecretString) {
		for pair in cookie.expose().split(';') {
			let pair = pair.trim();
			if !pair.is_empty() {
				self.jar.add_cookie_str(pair, &self.endpoint);
			}
		}
	}

	/// The `Cookie` header the jar would send, if any.
	pub fn session_cookie(&self) -> Option<SecretString> {
		let header = self.jar.cookies(&self.endpoint)?;
		let value = header.to_str().ok()?;
		Some(SecretString::new(value.to_string()))
	}

	fn action_url(&self, action: ApiAction, query: Option<&str>) -> Url {
		let mut url = self.endpoint.clone();
		{
			let mut pairs = url.query_pairs_mut();
			pairs.append_pair("action", action.as_str());
			if let Some(q) = query {
				pairs.append_pair("q", q);
			}
		}
		url
	}

	/// Invokes `action` and returns the decoded body.
	///
	/// With a payload the call is a POST; without one it is a retried GET.
	pub async fn call(&self, action: ApiAction, payload: Option<&Value>) -> Result<Value, ApiError> {
		self.send(action, None, payload).await
	}

	async fn send(
		&self,
		action: ApiAction,
		query: Option<&str>,
		payload: Option<&Value>,
	) -> Result<Value, ApiError> {
		let url = self.action_url(action, query);

		debug!(action = %action, url = %url, has_body = payload.is_some(), "calling backend");

		let response = match payload {
			Some(body) => self
				.http
				.post(url)
				.json(body)
				.send()
				.await
				.map_err(ApiError::connectivity)?,
			None => {
				retry(&self.read_retry, || async {
					self
						.http
						.get(url.clone())
						.send()
						.await
						.map_err(ApiError::connectivity)
				})
				.await?
			}
		};

		let status = response.status();
		let text = response
			.text()
			.await
			.map_err(|e| ApiError::Decode(format!("{action}: {e}")))?;

		if !status.is_success() {
			let message = error_message(&text)
				.unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
			debug!(action = %action, status = %status, message = %message, "backend returned error");
			return Err(ApiError::from_status(status, message));
		}

		if text.trim().is_empty() {
			return Ok(Value::Null);
		}

		let value: Value =
			serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{action}: {e}")))?;

		if value.get("success").and_then(Value::as_bool) == Some(false) {
			let message = message_field(&value).unwrap_or_else(|| format!("{action} was not accepted"));
			return Err(ApiError::Rejected(message));
		}

		Ok(value)
	}
}

fn message_field(value: &Value) -> Option<String> {
	["error", "message"]
		.iter()
		.find_map(|key| value.get(*key).and_then(Value::as_str))
		.map(str::to_string)
}

fn error_message(text: &str) -> Option<String> {
	let value: Value = serde_json::from_str(text).ok()?;
	message_field(&value)
}

/// Accepts a bare array or an object wrapping it under `data`.
fn equipment_list(value: Value) -> Result<Vec<Equipment>, ApiError> {
	let rows = match value {
		Value::Array(rows) => Value::Array(rows),
		Value::Object(mut map) => map
			.remove("data")
			.or_else(|| map.remove("equipos"))
			.ok_or_else(|| ApiError::Decode("get_equipos: no equipment array in response".to_string()))?,
		Value::Null => return Ok(Vec::new()),
		other => {
			return Err(ApiError::Decode(format!(
				"get_equipos: unexpected response {other}"
			)))
		}
	};
	serde_json::from_value(rows).map_err(|e| ApiError::Decode(format!("get_equipos: {e}")))
}

fn to_body<T: serde::Serialize>(action: ApiAction, value: &T) -> Result<Value, ApiError> {
	serde_json::to_value(value).map_err(|e| ApiError::Decode(format!("{action}: {e}")))
}

#[async_trait]
impl InventoryApi for HttpInventoryClient {
	async fn list_equipment(&self, query: Option<&str>) -> Result<Vec<Equipment>, ApiError> {
		let query = query.map(str::trim).filter(|q| !q.is_empty());
		let value = self.send(ApiAction::ListEquipment, query, None).await?;
		let records = equipment_list(value)?;
		debug!(count = records.len(), query = ?query, "listed equipment from backend");
		Ok(records)
	}

	async fn create_equipment(&self, record: &NewEquipment) -> Result<CreatedEquipment, ApiError> {
		let body = to_body(ApiAction::AddEquipment, record)?;
		let value = self.call(ApiAction::AddEquipment, Some(&body)).await?;
		let created: CreatedEquipment = serde_json::from_value(value).unwrap_or_default();
		info!(name = %record.name, id = ?created.id, "equipment created on backend");
		Ok(created)
	}

	async fn update_equipment(&self, patch: &EquipmentPatch) -> Result<(), ApiError> {
		let body = to_body(ApiAction::UpdateEquipment, patch)?;
		self.call(ApiAction::UpdateEquipment, Some(&body)).await?;
		info!(id = %patch.id, "equipment updated on backend");
		Ok(())
	}

	async fn delete_equipment(&self, id: &EquipmentId) -> Result<(), ApiError> {
		let body = json!({ "id": id });
		self.call(ApiAction::DeleteEquipment, Some(&body)).await?;
		info!(id = %id, "equipment deleted on backend");
		Ok(())
	}

	async fn is_reachable(&self) -> bool {
		match self.send(ApiAction::CheckSession, None, None).await {
			Err(ApiError::Connectivity(message)) => {
				debug!(error = %message, "backend unreachable");
				false
			}
			_ => true,
		}
	}
}

#[async_trait]
impl SessionApi for HttpInventoryClient {
	async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
		let body = json!({
			"name": registration.name,
			"email": registration.email,
			"password": registration.password.expose(),
		});
		self.call(ApiAction::Register, Some(&body)).await?;
		info!(email = %registration.email, "account registered");
		Ok(())
	}

	async fn login(&self, credentials: &Credentials) -> Result<Option<SessionUser>, ApiError> {
		let body = json!({
			"email": credentials.email,
			"password": credentials.password.expose(),
		});
		let value = self.call(ApiAction::Login, Some(&body)).await?;
		let user = value
			.get("user")
			.cloned()
			.and_then(|user| serde_json::from_value(user).ok());
		info!(email = %credentials.email, "logged in");
		Ok(user)
	}

	async fn logout(&self) -> Result<(), ApiError> {
		match self.call(ApiAction::Logout, Some(&json!({}))).await {
			Ok(_) => {
				info!("logged out");
				Ok(())
			}
			Err(e) => {
				warn!(error = %e, "logout request failed");
				Err(e)
			}
		}
	}

	async fn check_session(&self) -> Result<SessionStatus, ApiError> {
		match self.call(ApiAction::CheckSession, None).await {
			Ok(value) => Ok(SessionStatus::from_response(&value)),
			Err(ApiError::Unauthenticated(_)) | Err(ApiError::Rejected(_)) => Ok(SessionStatus::logged_out()),
			Err(e) => Err(e),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::EquipmentStatus;
	use wiremock::matchers::{body_json, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	async fn client_for(server: &MockServer) -> HttpInventoryClient {
		let endpoint = Url::parse(&format!("{}/api.php", server.uri())).unwrap();
		HttpInventoryClient::new(endpoint, &ClientOptions::default())
			.unwrap()
			.with_read_retry(RetryConfig::no_retry())
	}

	#[tokio::test]
	async fn lists_equipment_from_bare_array() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api.php"))
			.and(query_param("action", "get_equipos"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!([
				{"id": 2, "nombre": "Balanza", "descripcion": "0.1 mg", "estado": "Disponible"},
				{"id": "1", "nombre": "Centrífuga", "descripcion": null, "estado": "Mantenimiento"}
			])))
			.mount(&server)
			.await;

		let records = client_for(&server).await.list_equipment(None).await.unwrap();
		assert_eq!(records.len(), 2);
		assert_eq!(records[1].id, EquipmentId::Server(1));
		assert_eq!(records[1].status, EquipmentStatus::Maintenance);
	}

	#[tokio::test]
	async fn search_sends_query_and_accepts_data_wrapper() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(query_param("action", "get_equipos"))
			.and(query_param("q", "osc"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"data": [{"id": 5, "nombre": "Osciloscopio", "estado": "Ocupado"}]
			})))
			.expect(1)
			.mount(&server)
			.await;

		let records = client_for(&server)
			.await
			.list_equipment(Some(" osc "))
			.await
			.unwrap();
		assert_eq!(records.len(), 1);
		assert_eq!(records[0].name, "Osciloscopio");
	}

	#[tokio::test]
	async fn create_posts_backend_fields_and_returns_id() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(query_param("action", "add_equipo"))
			.and(body_json(json!({
				"nombre": "Pipeta",
				"descripcion": "",
				"estado": "Disponible"
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "id": 31})))
			.expect(1)
			.mount(&server)
			.await;

		let created = client_for(&server)
			.await
			.create_equipment(&NewEquipment::new("Pipeta"))
			.await
			.unwrap();
		assert_eq!(created.id, Some(31));
	}

	#[tokio::test]
	async fn create_without_id_in_response_is_still_success() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
			.mount(&server)
			.await;

		let created = client_for(&server)
			.await
			.create_equipment(&NewEquipment::new("Pipeta"))
			.await
			.unwrap();
		assert_eq!(created.id, None);
	}

	#[tokio::test]
	async fn writes_are_not_retried() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db down"})))
			.expect(1)
			.mount(&server)
			.await;

		let client = client_for(&server)
			.await
			.with_read_retry(RetryConfig {
				max_attempts: 5,
				..RetryConfig::default()
			});
		let err = client
			.delete_equipment(&EquipmentId::Server(4))
			.await
			.unwrap_err();
		match err {
			ApiError::Server { status, message } => {
				assert_eq!(status.as_u16(), 500);
				assert_eq!(message, "db down");
			}
			other => panic!("expected server error, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn status_codes_become_typed_errors() {
		let server = MockServer::start().await;
		Mock::given(query_param("action", "update_equipo"))
			.respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "nombre requerido"})))
			.mount(&server)
			.await;
		Mock::given(query_param("action", "login"))
			.respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad password"})))
			.mount(&server)
			.await;
		Mock::given(query_param("action", "get_equipos"))
			.respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "No autorizado"})))
			.mount(&server)
			.await;

		let client = client_for(&server).await;

		let patch = EquipmentPatch::new(EquipmentId::Server(1)).with_name("x");
		assert!(matches!(
			client.update_equipment(&patch).await,
			Err(ApiError::Validation(m)) if m == "nombre requerido"
		));

		let credentials = Credentials {
			email: "a@b.c".to_string(),
			password: SecretString::new("wrong".to_string()),
		};
		assert!(matches!(
			client.login(&credentials).await,
			Err(ApiError::InvalidCredentials(_))
		));

		assert!(matches!(
			client.list_equipment(None).await,
			Err(ApiError::Unauthenticated(_))
		));
	}

	#[tokio::test]
	async fn success_false_is_rejected() {
		let server = MockServer::start().await;
		Mock::given(query_param("action", "delete_equipo"))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(json!({"success": false, "error": "in use"})),
			)
			.mount(&server)
			.await;

		let err = client_for(&server)
			.await
			.delete_equipment(&EquipmentId::Server(9))
			.await
			.unwrap_err();
		assert!(matches!(err, ApiError::Rejected(m) if m == "in use"));
	}

	#[tokio::test]
	async fn unreachable_backend_is_connectivity_error() {
		let endpoint = Url::parse("http://127.0.0.1:1/api.php").unwrap();
		let client = HttpInventoryClient::new(endpoint, &ClientOptions::default())
			.unwrap()
			.with_read_retry(RetryConfig::no_retry());

		let err = client
			.create_equipment(&NewEquipment::new("Pipeta"))
			.await
			.unwrap_err();
		assert!(err.is_connectivity());
		assert!(!client.is_reachable().await);
	}

	#[tokio::test]
	async fn any_http_answer_counts_as_reachable() {
		let server = MockServer::start().await;
		Mock::given(query_param("action", "check_session"))
			.respond_with(ResponseTemplate::new(403))
			.mount(&server)
			.await;

		assert!(client_for(&server).await.is_reachable().await);
	}

	#[tokio::test]
	async fn check_session_reports_logged_out_on_403() {
		let server = MockServer::start().await;
		Mock::given(query_param("action", "check_session"))
			.respond_with(ResponseTemplate::new(403))
			.mount(&server)
			.await;

		let status = client_for(&server).await.check_session().await.unwrap();
		assert!(!status.logged_in);
	}

	#[tokio::test]
	async fn login_cookie_is_exported_and_restored() {
		let server = MockServer::start().await;
		Mock::given(query_param("action", "login"))
			.respond_with(
				ResponseTemplate::new(200)
					.insert_header("set-cookie", "PHPSESSID=abc123; Path=/")
					.set_body_json(json!({"success": true, "user": {"id": 1, "name": "Ana"}})),
			)
			.mount(&server)
			.await;

		let client = client_for(&server).await;
		let user = client
			.login(&Credentials {
				email: "ana@lab.test".to_string(),
				password: SecretString::new("pw".to_string()),
			})
			.await
			.unwrap();
		assert_eq!(user.and_then(|u| u.name).as_deref(), Some("Ana"));

		let cookie = client.session_cookie().unwrap();
		assert_eq!(cookie.expose(), "PHPSESSID=abc123");

		let fresh = client_for(&server).await;
		assert!(fresh.session_cookie().is_none());
		fresh.restore_session(&cookie);
		assert_eq!(fresh.session_cookie().unwrap().expose(), "PHPSESSID=abc123");
	}

	#[test]
	fn endpoint_joins_base_url() {
		let base = Url::parse("http://localhost/inventario/").unwrap();
		let client = HttpInventoryClient::from_base(&base, "api.php", &ClientOptions::default()).unwrap();
		assert_eq!(client.endpoint().as_str(), "http://localhost/inventario/api.php");
		assert_eq!(
			client
				.action_url(ApiAction::ListEquipment, Some("a b"))
				.as_str(),
			"http://localhost/inventario/api.php?action=get_equipos&q=a+b"
		);
	}
}
