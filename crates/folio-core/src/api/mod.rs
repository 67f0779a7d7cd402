//! HTTP client for the blogging backend.
//!
//! Every method takes a [`CancellationToken`]; a fired token resolves the
//! call to [`ApiError::Cancelled`] and the eventual response is never
//! observed. Not-found lookups are data ([`Option`]), not errors.

pub mod error;
pub mod types;

pub use error::ApiError;
pub use types::{Author, FollowerSummary, Post, Profile, ProfileCounts};

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::session::UserIdentity;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::Url {
            details: e.to_string(),
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url.join(path).map_err(|e| ApiError::Url {
            details: e.to_string(),
        })
    }

    /// Run a request race against the cancellation token. A fired token wins
    /// immediately; the in-flight request future is dropped, which aborts the
    /// underlying connection.
    async fn request_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        tokio::select! {
            () = cancel.cancelled() => Err(ApiError::Cancelled),
            result = async {
                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ApiError::Status {
                        status: status.as_u16(),
                    });
                }
                response.json::<T>().await.map_err(|e| ApiError::Decode {
                    details: e.to_string(),
                })
            } => result,
        }
    }

    pub async fn check_token(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, ApiError> {
        let url = self.endpoint("/checkToken")?;
        self.request_json(self.http.post(url).json(&json!({ "token": token })), cancel)
            .await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<UserIdentity, ApiError> {
        let url = self.endpoint("/register")?;
        let body = json!({ "username": username, "email": email, "password": password });
        self.request_json(self.http.post(url).json(&body), cancel)
            .await
    }

    pub async fn does_username_exist(
        &self,
        username: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, ApiError> {
        let url = self.endpoint("/doesUsernameExist")?;
        self.request_json(
            self.http.post(url).json(&json!({ "username": username })),
            cancel,
        )
        .await
    }

    pub async fn does_email_exist(
        &self,
        email: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, ApiError> {
        let url = self.endpoint("/doesEmailExist")?;
        self.request_json(self.http.post(url).json(&json!({ "email": email })), cancel)
            .await
    }

    /// Create a post; resolves to the new post's id.
    pub async fn create_post(
        &self,
        title: &str,
        body: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        let url = self.endpoint("/create-post")?;
        let payload = json!({ "title": title, "body": body, "token": token });
        self.request_json(self.http.post(url).json(&payload), cancel)
            .await
    }

    /// Look up a post. The server answers with the post object, or with a
    /// falsy body when no such post exists; the latter maps to `None`.
    pub async fn fetch_post(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Post>, ApiError> {
        let url = self.endpoint(&format!("/post/{id}"))?;
        let value: Value = self.request_json(self.http.get(url), cancel).await?;
        post_from_lookup(value)
    }

    /// Save edits to a post. The server echoes the updated post; the client
    /// only needs success, so the body is discarded.
    pub async fn edit_post(
        &self,
        id: &str,
        title: &str,
        body: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/post/{id}/edit"))?;
        let payload = json!({ "title": title, "body": body, "token": token });
        let _: Value = self
            .request_json(self.http.post(url).json(&payload), cancel)
            .await?;
        Ok(())
    }

    /// Delete a post. Resolves to `true` only when the server answers with
    /// its literal success marker.
    pub async fn delete_post(
        &self,
        id: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, ApiError> {
        let url = self.endpoint(&format!("/post/{id}"))?;
        let value: Value = self
            .request_json(
                self.http.delete(url).json(&json!({ "token": token })),
                cancel,
            )
            .await?;
        Ok(is_delete_success(&value))
    }

    pub async fn home_feed(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Post>, ApiError> {
        let url = self.endpoint("/getHomeFeed")?;
        self.request_json(self.http.post(url).json(&json!({ "token": token })), cancel)
            .await
    }

    pub async fn profile(
        &self,
        username: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Profile, ApiError> {
        let url = self.endpoint(&format!("/profile/{username}"))?;
        self.request_json(self.http.post(url).json(&json!({ "token": token })), cancel)
            .await
    }

    pub async fn profile_posts(
        &self,
        username: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Post>, ApiError> {
        let url = self.endpoint(&format!("/profile/{username}/posts"))?;
        self.request_json(self.http.get(url), cancel).await
    }

    pub async fn profile_followers(
        &self,
        username: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<FollowerSummary>, ApiError> {
        let url = self.endpoint(&format!("/profile/{username}/followers"))?;
        self.request_json(self.http.get(url), cancel).await
    }

    pub async fn profile_following(
        &self,
        username: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<FollowerSummary>, ApiError> {
        let url = self.endpoint(&format!("/profile/{username}/following"))?;
        self.request_json(self.http.get(url), cancel).await
    }

    pub async fn add_follow(
        &self,
        username: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/addFollow/{username}"))?;
        let _: Value = self
            .request_json(self.http.post(url).json(&json!({ "token": token })), cancel)
            .await?;
        Ok(())
    }

    pub async fn remove_follow(
        &self,
        username: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/removeFollow/{username}"))?;
        let _: Value = self
            .request_json(self.http.post(url).json(&json!({ "token": token })), cancel)
            .await?;
        Ok(())
    }

    pub async fn search(
        &self,
        search_term: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Post>, ApiError> {
        let url = self.endpoint("/search")?;
        self.request_json(
            self.http.post(url).json(&json!({ "searchTerm": search_term })),
            cancel,
        )
        .await
    }
}

/// Interpret a post-lookup body: a falsy value means not-found, an object is
/// the post itself. Anything else is a malformed response.
fn post_from_lookup(value: Value) -> Result<Option<Post>, ApiError> {
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::String(ref s) if s.is_empty() => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(|e| ApiError::Decode {
                details: e.to_string(),
            }),
    }
}

/// The delete endpoint acks with the literal string `"Success"`.
fn is_delete_success(value: &Value) -> bool {
    value.as_str() == Some("Success")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_json() -> Value {
        json!({
            "_id": "abc123",
            "title": "First post",
            "body": "hello",
            "createdDate": "2024-01-05T00:00:00.000Z",
            "author": { "username": "alice", "avatar": "a.png" }
        })
    }

    #[test]
    fn lookup_maps_object_to_post() {
        let post = post_from_lookup(post_json()).unwrap().unwrap();
        assert_eq!(post.id, "abc123");
        assert_eq!(post.author.username, "alice");
        assert!(!post.is_visitor_owner);
    }

    #[test]
    fn lookup_maps_falsy_to_none() {
        assert!(post_from_lookup(Value::Null).unwrap().is_none());
        assert!(post_from_lookup(Value::Bool(false)).unwrap().is_none());
        assert!(post_from_lookup(json!("")).unwrap().is_none());
    }

    #[test]
    fn lookup_rejects_malformed_body() {
        let result = post_from_lookup(json!({ "unexpected": true }));
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }

    #[test]
    fn delete_ack_requires_exact_literal() {
        assert!(is_delete_success(&json!("Success")));
        assert!(!is_delete_success(&json!("success")));
        assert!(!is_delete_success(&json!(true)));
        assert!(!is_delete_success(&Value::Null));
    }
}
