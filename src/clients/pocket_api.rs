use crate::data::{ArticleStore, ArticleStoreError, Favorite, Favorites, GetOpts, ItemId};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Public Pocket endpoint
pub const DEFAULT_BASE_URL: &str = "https://getpocket.com";

/// [`ArticleStore`] talking to the Pocket v3 API.
///
/// See <https://getpocket.com/developer/docs/overview>. Tokens come from
/// configuration; the OAuth handshake that issues them is not handled here.
#[derive(Clone)]
pub struct PocketApi {
    base_url: String,
    consumer_key: String,
    access_token: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct GetRequest<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    state: &'static str,
    #[serde(rename = "detailType")]
    detail_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    favorite: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<&'a str>,
}

#[derive(Deserialize)]
struct GetResponse {
    #[serde(default)]
    list: Option<ArticleList>,
}

/// An empty result comes back as `"list": []` rather than an empty object
#[derive(Deserialize)]
#[serde(untagged)]
enum ArticleList {
    Items(Favorites),
    Empty(Vec<serde_json::Value>),
}

#[derive(Serialize)]
struct Action<'a> {
    action: &'static str,
    item_id: &'a str,
}

#[derive(Deserialize)]
struct ActionResults {
    #[serde(default)]
    action_results: Vec<serde_json::Value>,
    #[serde(default)]
    status: i64,
}

impl PocketApi {
    pub fn new(
        base_url: impl Into<String>,
        consumer_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            consumer_key: consumer_key.into(),
            access_token: access_token.into(),
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send_actions(&self, actions: &[Action<'_>]) -> Result<ActionResults, ArticleStoreError> {
        let actions_json = serde_json::to_string(actions)
            .map_err(|e| ArticleStoreError::Decode(format!("Failed to encode actions: {}", e)))?;
        debug!(actions = %actions_json, "sending actions");

        let resp = self
            .http
            .post(self.endpoint("v3/send"))
            .form(&[
                ("consumer_key", self.consumer_key.as_str()),
                ("access_token", self.access_token.as_str()),
                ("actions", actions_json.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp.status(), resp.headers())?;

        let results: ActionResults = resp.json().await.map_err(decode_error)?;
        debug!(results = ?results.action_results, status = results.status, "action results");

        if results
            .action_results
            .iter()
            .any(|result| *result == serde_json::Value::Bool(false))
        {
            return Err(ArticleStoreError::ActionRejected(format!(
                "action_results={:?}, status={}",
                results.action_results, results.status
            )));
        }

        Ok(results)
    }
}

impl ArticleStore for PocketApi {
    async fn fetch(&self, opts: &GetOpts) -> Result<Favorites, ArticleStoreError> {
        let request = GetRequest {
            consumer_key: &self.consumer_key,
            access_token: &self.access_token,
            state: "all",
            detail_type: "simple",
            favorite: opts.favorite.map(|favorite| match favorite {
                Favorite::Favorited => "1",
                Favorite::UnFavorited => "0",
            }),
            search: opts.search.as_deref(),
            domain: opts.domain.as_deref(),
        };

        let resp = self
            .http
            .post(self.endpoint("v3/get"))
            .header("X-Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp.status(), resp.headers())?;

        let body = resp.bytes().await.map_err(transport_error)?;
        decode_articles(&body)
    }

    /// The service reports success for ids that don't exist, so a successful
    /// return says nothing about which ids were actually removed.
    async fn delete(&self, item_ids: &[ItemId]) -> Result<(), ArticleStoreError> {
        if item_ids.is_empty() {
            return Ok(());
        }

        debug!(?item_ids, "remove items");
        let actions: Vec<Action<'_>> = item_ids
            .iter()
            .map(|item_id| Action {
                action: "delete",
                item_id: item_id.as_str(),
            })
            .collect();

        self.send_actions(&actions).await?;
        Ok(())
    }
}

fn decode_articles(body: &[u8]) -> Result<Favorites, ArticleStoreError> {
    let response: GetResponse =
        serde_json::from_slice(body).map_err(|e| ArticleStoreError::Decode(e.to_string()))?;
    match response.list {
        Some(ArticleList::Items(favorites)) => Ok(favorites),
        Some(ArticleList::Empty(_)) | None => Ok(Favorites::new()),
    }
}

fn check_status(status: reqwest::StatusCode, headers: &HeaderMap) -> Result<(), ArticleStoreError> {
    if status.is_success() {
        return Ok(());
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    Err(ArticleStoreError::Status {
        status: status.as_u16(),
        message: header("x-error"),
        code: header("x-error-code"),
    })
}

fn transport_error(e: reqwest::Error) -> ArticleStoreError {
    ArticleStoreError::Transport(e.to_string())
}

fn decode_error(e: reqwest::Error) -> ArticleStoreError {
    ArticleStoreError::Decode(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_decode_article_map() {
        let body = br#"{
            "status": 1,
            "list": {
                "229279689": {
                    "item_id": "229279689",
                    "resolved_url": "http://www.grantland.com/blog/the-triangle/post/_/id/38347/ryder-cup-preview",
                    "favorite": "1"
                }
            }
        }"#;

        let favorites = decode_articles(body).unwrap();
        assert_eq!(favorites.len(), 1);
        assert!(favorites.contains_key(&ItemId::new("229279689")));
    }

    #[test]
    fn test_decode_empty_list_array() {
        let favorites = decode_articles(br#"{"status": 2, "list": []}"#).unwrap();
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_decode_missing_list() {
        let favorites = decode_articles(br#"{"status": 1}"#).unwrap();
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode_articles(b"<html>");
        assert!(matches!(result, Err(ArticleStoreError::Decode(_))));
    }

    #[test]
    fn test_check_status_reads_error_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-error", HeaderValue::from_static("Invalid consumer key."));
        headers.insert("x-error-code", HeaderValue::from_static("152"));

        let result = check_status(reqwest::StatusCode::FORBIDDEN, &headers);
        assert_eq!(
            result,
            Err(ArticleStoreError::Status {
                status: 403,
                message: "Invalid consumer key.".to_string(),
                code: "152".to_string(),
            })
        );
        assert!(check_status(reqwest::StatusCode::OK, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_get_request_shape() {
        let request = GetRequest {
            consumer_key: "ck",
            access_token: "at",
            state: "all",
            detail_type: "simple",
            favorite: Some("1"),
            search: None,
            domain: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "consumer_key": "ck",
                "access_token": "at",
                "state": "all",
                "detailType": "simple",
                "favorite": "1"
            })
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let api = PocketApi::new("http://127.0.0.1:9/", "ck", "at");
        assert_eq!(api.endpoint("v3/get"), "http://127.0.0.1:9/v3/get");
    }

    #[tokio::test]
    async fn test_delete_nothing_sends_nothing() {
        // Port 9 is discard; an actual request would fail.
        let api = PocketApi::new("http://127.0.0.1:9", "ck", "at");
        assert!(api.delete(&[]).await.is_ok());
    }
}
