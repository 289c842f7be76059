use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::StoreConfig;

use super::api_types::{parse_error_body, ApiError};
use super::error::StoreError;
use super::store::EmployeeStore;
use super::types::{DepartmentFilter, Employee, EmployeeFormData, EmployeePatch};

/// Columns searched by the free-text filter
const SEARCH_COLUMNS: &[&str] = &["first_name", "last_name", "email", "job_title"];

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// REST client for an employee table exposed through PostgREST
#[derive(Clone)]
pub struct RestStore {
  http: reqwest::Client,
  table_url: Url,
}

impl RestStore {
  /// Create a client for `config`, authenticating requests with the project
  /// `api_key` and, once signed in, the session `access_token`.
  pub fn new(config: &StoreConfig, api_key: &str, access_token: Option<&str>) -> Result<Self> {
    let table_url = table_url(&config.url, &config.table)?;

    let bearer = format!("Bearer {}", access_token.unwrap_or(api_key));
    let mut headers = HeaderMap::new();
    headers.insert(
      "apikey",
      HeaderValue::from_str(api_key).map_err(|e| eyre!("Invalid API key: {}", e))?,
    );
    headers.insert(
      AUTHORIZATION,
      HeaderValue::from_str(&bearer).map_err(|e| eyre!("Invalid access token: {}", e))?,
    );

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, table_url })
  }

  fn id_filter(id: &str) -> (&'static str, String) {
    ("id", format!("eq.{}", id))
  }
}

/// Resolve `<base>/rest/v1/<table>`, keeping any path prefix on the base URL
fn table_url(base: &str, table: &str) -> Result<Url> {
  let mut base = Url::parse(base).map_err(|e| eyre!("Invalid store URL {}: {}", base, e))?;
  if !base.path().ends_with('/') {
    let path = format!("{}/", base.path());
    base.set_path(&path);
  }
  base
    .join(&format!("rest/v1/{}", table))
    .map_err(|e| eyre!("Invalid table name {}: {}", table, e))
}

/// `or=(first_name.ilike."*s*",...)` value for a search string
fn search_filter(search: &str) -> String {
  let pattern = quote(&format!("*{}*", search));
  let clauses: Vec<String> = SEARCH_COLUMNS
    .iter()
    .map(|column| format!("{}.ilike.{}", column, pattern))
    .collect();
  format!("({})", clauses.join(","))
}

/// Double-quote a filter value so reserved characters (`,` `(` `)` `.`) are literal
fn quote(value: &str) -> String {
  format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
  let status = response.status();
  if status.is_success() {
    return response
      .json::<T>()
      .await
      .map_err(|e| StoreError::transport(format!("Failed to parse response: {}", e)));
  }
  let body = response.text().await.unwrap_or_default();
  Err(parse_error_body::<ApiError>(&body).into_store_error(status))
}

#[async_trait]
impl EmployeeStore for RestStore {
  async fn list(
    &self,
    search: &str,
    department: DepartmentFilter,
  ) -> Result<Vec<Employee>, StoreError> {
    debug!(search, department = %department, "listing employees");

    let mut params: Vec<(&str, String)> = vec![
      ("select", "*".to_string()),
      ("order", "last_name.asc".to_string()),
    ];
    if !search.is_empty() {
      params.push(("or", search_filter(search)));
    }
    if let Some(d) = department.department() {
      params.push(("department", format!("eq.{}", d.as_str())));
    }

    let response = self
      .http
      .get(self.table_url.clone())
      .query(&params)
      .send()
      .await
      .map_err(StoreError::transport)?;

    read_json(response).await
  }

  async fn get(&self, id: &str) -> Result<Employee, StoreError> {
    debug!(id, "fetching employee");

    let response = self
      .http
      .get(self.table_url.clone())
      .query(&[("select", "*".to_string()), Self::id_filter(id)])
      .header(ACCEPT, SINGLE_OBJECT)
      .send()
      .await
      .map_err(StoreError::transport)?;

    read_json(response).await
  }

  async fn create(&self, data: &EmployeeFormData) -> Result<Employee, StoreError> {
    debug!(email = %data.email, "creating employee");

    let response = self
      .http
      .post(self.table_url.clone())
      .query(&[("select", "*")])
      .header(ACCEPT, SINGLE_OBJECT)
      .header("Prefer", "return=representation")
      .json(&[data])
      .send()
      .await
      .map_err(StoreError::transport)?;

    read_json(response).await
  }

  async fn update(&self, id: &str, patch: &EmployeePatch) -> Result<Employee, StoreError> {
    debug!(id, "updating employee");

    let response = self
      .http
      .patch(self.table_url.clone())
      .query(&[("select", "*".to_string()), Self::id_filter(id)])
      .header(ACCEPT, SINGLE_OBJECT)
      .header("Prefer", "return=representation")
      .json(patch)
      .send()
      .await
      .map_err(StoreError::transport)?;

    read_json(response).await
  }

  async fn delete(&self, id: &str) -> Result<(), StoreError> {
    debug!(id, "deleting employee");

    let response = self
      .http
      .delete(self.table_url.clone())
      .query(&[Self::id_filter(id)])
      .send()
      .await
      .map_err(StoreError::transport)?;

    let status = response.status();
    if status.is_success() {
      return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(parse_error_body::<ApiError>(&body).into_store_error(status))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::employee::types::fixtures::{employee, form_data};
  use crate::employee::types::Department;
  use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  const TABLE_PATH: &str = "/rest/v1/employees";

  fn store_for(server: &MockServer) -> RestStore {
    let config = StoreConfig {
      url: server.uri(),
      table: "employees".to_string(),
    };
    RestStore::new(&config, "anon-key", Some("user-token")).unwrap()
  }

  #[test]
  fn test_table_url_keeps_prefix() {
    assert_eq!(
      table_url("https://abc.supabase.co", "employees")
        .unwrap()
        .as_str(),
      "https://abc.supabase.co/rest/v1/employees"
    );
    assert_eq!(
      table_url("http://localhost:8000/proxy", "staff")
        .unwrap()
        .as_str(),
      "http://localhost:8000/proxy/rest/v1/staff"
    );
  }

  #[test]
  fn test_search_filter_quotes_reserved_characters() {
    assert_eq!(
      search_filter("o'neil, (jr)"),
      "(first_name.ilike.\"*o'neil, (jr)*\",last_name.ilike.\"*o'neil, (jr)*\",\
       email.ilike.\"*o'neil, (jr)*\",job_title.ilike.\"*o'neil, (jr)*\")"
    );
    assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
  }

  #[tokio::test]
  async fn test_list_applies_filters_and_order() {
    let server = MockServer::start().await;
    let rows = vec![
      employee("1", "Ann", "Baker", Department::Engineering),
      employee("2", "Ali", "Young", Department::Engineering),
    ];

    Mock::given(method("GET"))
      .and(path(TABLE_PATH))
      .and(query_param("order", "last_name.asc"))
      .and(query_param("department", "eq.Engineering"))
      .and(query_param(
        "or",
        "(first_name.ilike.\"*al*\",last_name.ilike.\"*al*\",email.ilike.\"*al*\",job_title.ilike.\"*al*\")",
      ))
      .and(header("apikey", "anon-key"))
      .and(header("authorization", "Bearer user-token"))
      .respond_with(ResponseTemplate::new(200).set_body_json(&rows))
      .expect(1)
      .mount(&server)
      .await;

    let store = store_for(&server);
    let result = store
      .list("al", DepartmentFilter::Only(Department::Engineering))
      .await
      .unwrap();
    assert_eq!(result, rows);
  }

  #[tokio::test]
  async fn test_list_without_filters_sends_no_filter_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path(TABLE_PATH))
      .and(query_param_is_missing("or"))
      .and(query_param_is_missing("department"))
      .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<Employee>::new()))
      .expect(1)
      .mount(&server)
      .await;

    let store = store_for(&server);
    let result = store.list("", DepartmentFilter::All).await.unwrap();
    assert!(result.is_empty());
  }

  #[tokio::test]
  async fn test_get_missing_row_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path(TABLE_PATH))
      .and(query_param("id", "eq.nonexistent-id"))
      .and(header("accept", SINGLE_OBJECT))
      .respond_with(ResponseTemplate::new(406).set_body_json(serde_json::json!({
        "code": "PGRST116",
        "details": "The result contains 0 rows",
        "hint": null,
        "message": "JSON object requested, multiple (or no) rows returned"
      })))
      .mount(&server)
      .await;

    let store = store_for(&server);
    let err = store.get("nonexistent-id").await.unwrap_err();
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn test_create_posts_form_data_and_returns_row() {
    let server = MockServer::start().await;
    let data = form_data("Grace", "Hopper", Department::Product);
    let row = employee("new-id", "Grace", "Hopper", Department::Product);

    Mock::given(method("POST"))
      .and(path(TABLE_PATH))
      .and(header("prefer", "return=representation"))
      .and(body_json(serde_json::json!([data])))
      .respond_with(ResponseTemplate::new(201).set_body_json(&row))
      .expect(1)
      .mount(&server)
      .await;

    let store = store_for(&server);
    let created = store.create(&data).await.unwrap();
    assert_eq!(created.id, "new-id");
  }

  #[tokio::test]
  async fn test_create_duplicate_email_is_validation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path(TABLE_PATH))
      .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
        "code": "23505",
        "details": "Key (email)=(grace.hopper@example.com) already exists.",
        "hint": null,
        "message": "duplicate key value violates unique constraint \"employees_email_key\""
      })))
      .mount(&server)
      .await;

    let store = store_for(&server);
    let err = store
      .create(&form_data("Grace", "Hopper", Department::Product))
      .await
      .unwrap_err();
    assert_eq!(err.code(), Some("23505"));
    assert!(err.to_string().contains("duplicate key"));
  }

  #[tokio::test]
  async fn test_update_sends_only_patched_fields() {
    let server = MockServer::start().await;
    let mut row = employee("7", "Ann", "Baker", Department::Engineering);
    row.job_title = "Principal Engineer".to_string();

    Mock::given(method("PATCH"))
      .and(path(TABLE_PATH))
      .and(query_param("id", "eq.7"))
      .and(body_json(serde_json::json!({ "job_title": "Principal Engineer" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(&row))
      .expect(1)
      .mount(&server)
      .await;

    let store = store_for(&server);
    let patch = EmployeePatch {
      job_title: Some("Principal Engineer".to_string()),
      ..Default::default()
    };
    let updated = store.update("7", &patch).await.unwrap();
    assert_eq!(updated, row);
  }

  #[tokio::test]
  async fn test_delete_succeeds_on_no_content() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
      .and(path(TABLE_PATH))
      .and(query_param("id", "eq.gone"))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;

    let store = store_for(&server);
    store.delete("gone").await.unwrap();
  }

  #[tokio::test]
  async fn test_expired_session_is_auth_required() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path(TABLE_PATH))
      .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
        "code": "PGRST301",
        "message": "JWT expired"
      })))
      .mount(&server)
      .await;

    let store = store_for(&server);
    let err = store.list("", DepartmentFilter::All).await.unwrap_err();
    assert!(err.is_auth_required());
  }

  #[tokio::test]
  async fn test_unreachable_store_is_transport_error() {
    let config = StoreConfig {
      url: "http://127.0.0.1:9".to_string(),
      table: "employees".to_string(),
    };
    let store = RestStore::new(&config, "anon-key", None).unwrap();
    let err = store.list("", DepartmentFilter::All).await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)));
  }
}
