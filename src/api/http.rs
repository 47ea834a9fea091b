//! HTTP content store.
//!
//! Talks to `<host>/api/<version>` with a bearer token. The reqwest client is
//! async; each call is driven to completion on a runtime owned by the store,
//! so callers see plain blocking calls.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::{CollectionScope, ContentStore, LookSearch, StoreError, StoreResult};
use crate::config::ConnectionSettings;
use crate::error::{Error, Result};
use crate::model::Attrs;

/// Content store backed by the platform's REST API.
pub struct HttpContentStore {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    base_url: String,
    token: String,
    /// True when the token came from `/login` and should be released.
    owns_session: bool,
}

/// `POST /login` response.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

impl HttpContentStore {
    /// Open a session.
    ///
    /// Uses the configured access token as-is, or exchanges the client
    /// id/secret for one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the client cannot be built or no
    /// credentials are set, and [`Error::RemoteQuery`] when login fails.
    pub fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| Error::Other(format!("Failed to create tokio runtime: {e}")))?;
        let base_url = settings.api_url();

        let mut store = Self {
            client,
            runtime,
            base_url,
            token: String::new(),
            owns_session: false,
        };

        if let Some(token) = &settings.access_token {
            store.token.clone_from(token);
            return Ok(store);
        }

        let (Some(client_id), Some(client_secret)) = (&settings.client_id, &settings.client_secret)
        else {
            return Err(Error::Config(
                "No credentials configured: need an access token or a client id and secret"
                    .to_string(),
            ));
        };

        let request = store
            .client
            .post(store.url("/login"))
            .form(&[("client_id", client_id), ("client_secret", client_secret)]);
        let login: LoginResponse = store
            .runtime
            .block_on(send_json(request, || StoreError::remote("login endpoint not found")))
            .map_err(|e| Error::RemoteQuery {
                context: format!("Error logging in to {}", store.base_url),
                message: e.to_string(),
            })?;

        info!(url = %store.base_url, "session opened");
        store.token = login.access_token;
        store.owns_session = true;
        Ok(store)
    }

    /// Release a session opened by [`connect`](Self::connect).
    ///
    /// Tokens supplied by the caller are left alone.
    ///
    /// # Errors
    ///
    /// Returns the store error when the logout call fails.
    pub fn logout(&self) -> StoreResult<()> {
        if !self.owns_session {
            return Ok(());
        }
        let request = self.request(Method::DELETE, "/logout");
        self.runtime.block_on(send_empty(request, || {
            StoreError::remote("logout endpoint not found")
        }))?;
        debug!("session closed");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(&self.token)
    }

    fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        not_found: impl FnOnce() -> StoreError,
    ) -> StoreResult<T> {
        self.runtime.block_on(send_json(request, not_found))
    }
}

fn missing(resource: &'static str, id: &str) -> impl FnOnce() -> StoreError {
    let id = id.to_string();
    move || StoreError::NotFound { resource, id }
}

async fn checked(
    request: RequestBuilder,
    not_found: impl FnOnce() -> StoreError,
) -> StoreResult<reqwest::Response> {
    let response = request
        .send()
        .await
        .map_err(|e| StoreError::remote(format!("request failed: {e}")))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(not_found());
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Remote {
            status: Some(status.as_u16()),
            message: format!("{status}: {body}"),
        });
    }
    Ok(response)
}

async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    not_found: impl FnOnce() -> StoreError,
) -> StoreResult<T> {
    checked(request, not_found)
        .await?
        .json()
        .await
        .map_err(|e| StoreError::remote(format!("failed to parse response: {e}")))
}

async fn send_empty(
    request: RequestBuilder,
    not_found: impl FnOnce() -> StoreError,
) -> StoreResult<()> {
    checked(request, not_found).await.map(|_| ())
}

impl ContentStore for HttpContentStore {
    fn look(&self, id: &str) -> StoreResult<Attrs> {
        debug!(id, "GET look");
        self.call(self.request(Method::GET, &format!("/looks/{id}")), missing("look", id))
    }

    fn search_looks(&self, criteria: &LookSearch) -> StoreResult<Vec<Attrs>> {
        debug!(?criteria, "search looks");
        let request = self.request(Method::GET, "/looks/search").query(criteria);
        self.call(request, || StoreError::remote("look search endpoint not found"))
    }

    fn create_look(&self, body: &Attrs) -> StoreResult<Attrs> {
        info!("create look");
        let request = self.request(Method::POST, "/looks").json(body);
        self.call(request, || StoreError::remote("look endpoint not found"))
    }

    fn update_look(&self, id: &str, body: &Attrs) -> StoreResult<Attrs> {
        info!(id, "update look");
        let request = self.request(Method::PATCH, &format!("/looks/{id}")).json(body);
        self.call(request, missing("look", id))
    }

    fn delete_look(&self, id: &str) -> StoreResult<()> {
        info!(id, "delete look");
        let request = self.request(Method::DELETE, &format!("/looks/{id}"));
        self.runtime.block_on(send_empty(request, missing("look", id)))
    }

    fn create_query(&self, body: &Attrs) -> StoreResult<Attrs> {
        info!("create query");
        let request = self.request(Method::POST, "/queries").json(body);
        self.call(request, || StoreError::remote("query endpoint not found"))
    }

    fn create_merge_query(&self, body: &Attrs) -> StoreResult<Attrs> {
        info!("create merge query");
        let request = self.request(Method::POST, "/merge_queries").json(body);
        self.call(request, || StoreError::remote("merge query endpoint not found"))
    }

    fn scheduled_plans_for_look(
        &self,
        look_id: &str,
        all_users: bool,
    ) -> StoreResult<Vec<Attrs>> {
        debug!(look_id, all_users, "GET scheduled plans");
        let request = self
            .request(Method::GET, &format!("/scheduled_plans/look/{look_id}"))
            .query(&[("all_users", all_users)]);
        self.call(request, missing("look", look_id))
    }

    fn color_collections(&self, scope: CollectionScope) -> StoreResult<Vec<Attrs>> {
        let path = match scope {
            CollectionScope::All => "/color_collections",
            CollectionScope::Custom => "/color_collections/custom",
        };
        debug!(path, "GET color collections");
        self.call(self.request(Method::GET, path), || {
            StoreError::remote("color collection endpoint not found")
        })
    }

    fn create_color_collection(&self, body: &Attrs) -> StoreResult<Attrs> {
        info!("create color collection");
        let request = self.request(Method::POST, "/color_collections").json(body);
        self.call(request, || {
            StoreError::remote("color collection endpoint not found")
        })
    }

    fn me(&self) -> StoreResult<Attrs> {
        self.call(self.request(Method::GET, "/user"), || {
            StoreError::remote("current user endpoint not found")
        })
    }

    fn user(&self, id: &str, fields: Option<&str>) -> StoreResult<Attrs> {
        debug!(id, ?fields, "GET user");
        let mut request = self.request(Method::GET, &format!("/users/{id}"));
        if let Some(fields) = fields {
            request = request.query(&[("fields", fields)]);
        }
        self.call(request, missing("user", id))
    }
}
