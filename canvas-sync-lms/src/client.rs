//! Canvas REST client.
//!
//! Requests are issued one at a time; Canvas throttles clients by the cost of concurrent
//! requests, so callers must not share one client across parallel tasks.

use canvas_sync_core::config::CanvasSettings;
use canvas_sync_core::source::{Assignment, AssignmentSource, Course, Submission};
use canvas_sync_core::{SyncError, SyncResult};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::link::next_page;

const PER_PAGE: &str = "100";

/// The user whose courses are synced
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

pub struct CanvasClient {
    http: reqwest::Client,
    /// `<canvas-url>/api/v1/`
    api_base: Url,
    api_key: String,
    user_id: String,
}

impl CanvasClient {
    pub fn new(settings: &CanvasSettings) -> SyncResult<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            api_base: api_base(&settings.url)?,
            api_key: settings.api_key.clone(),
            user_id: settings.user_id.clone(),
        })
    }

    /// Fetch the configured user, failing early on a wrong id or key.
    pub async fn user(&self) -> SyncResult<User> {
        let url = self.endpoint(&format!("users/{}", self.user_id), &[])?;
        let user: User = self.get_json(url).await?;
        info!("Connected to Canvas as {} ({})", user.name, user.id);
        Ok(user)
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> SyncResult<Url> {
        let mut url = self
            .api_base
            .join(path)
            .map_err(|e| SyncError::Lms(format!("Invalid Canvas path '{path}': {e}")))?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    async fn get(&self, url: &Url) -> SyncResult<reqwest::Response> {
        debug!(%url, "GET");

        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| SyncError::Lms(format!("Request to {} failed: {e}", url.path())))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Lms(format!(
                "Canvas API error {} for {}: {}",
                status,
                url.path(),
                body
            )));
        }

        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> SyncResult<T> {
        self.get(&url)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Lms(format!("Failed to parse response from {}: {e}", url.path())))
    }

    /// Fetch every page of a list endpoint
    async fn get_all<T: DeserializeOwned>(&self, url: Url) -> SyncResult<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            let resp = self.get(&url).await?;

            next = match next_page(resp.headers()) {
                Some(link) => Some(Url::parse(&link).map_err(|e| {
                    SyncError::Lms(format!("Invalid pagination link '{link}': {e}"))
                })?),
                None => None,
            };

            let page: Vec<T> = resp.json().await.map_err(|e| {
                SyncError::Lms(format!("Failed to parse response from {}: {e}", url.path()))
            })?;
            items.extend(page);
        }

        Ok(items)
    }
}

impl AssignmentSource for CanvasClient {
    async fn active_courses(&self) -> SyncResult<Vec<Course>> {
        let url = self.endpoint(
            &format!("users/{}/courses", self.user_id),
            &[("enrollment_state", "active"), ("per_page", PER_PAGE)],
        )?;
        self.get_all(url).await
    }

    async fn assignments(&self, course: &Course) -> SyncResult<Vec<Assignment>> {
        let url = self.endpoint(
            &format!("courses/{}/assignments", course.id),
            &[("per_page", PER_PAGE)],
        )?;
        let assignments: Vec<Assignment> = self.get_all(url).await?;
        debug!(course = %course.name, "{} assignments", assignments.len());
        Ok(assignments)
    }

    async fn assignment(&self, course: &Course, assignment_id: u64) -> SyncResult<Assignment> {
        let url = self.endpoint(
            &format!("courses/{}/assignments/{}", course.id, assignment_id),
            &[],
        )?;
        self.get_json(url).await
    }

    async fn submission(&self, course: &Course, assignment_id: u64) -> SyncResult<Submission> {
        let url = self.endpoint(
            &format!(
                "courses/{}/assignments/{}/submissions/{}",
                course.id, assignment_id, self.user_id
            ),
            &[],
        )?;
        self.get_json(url).await
    }
}

fn api_base(canvas_url: &str) -> SyncResult<Url> {
    let base = format!("{}/api/v1/", canvas_url.trim_end_matches('/'));
    Url::parse(&base).map_err(|e| SyncError::Config(format!("Invalid canvas-url '{canvas_url}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> CanvasClient {
        CanvasClient::new(&CanvasSettings {
            url: url.to_string(),
            user_id: "42".to_string(),
            api_key: "secret".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let client = client("https://canvas.example.edu/");

        let url = client
            .endpoint(
                "users/42/courses",
                &[("enrollment_state", "active"), ("per_page", PER_PAGE)],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://canvas.example.edu/api/v1/users/42/courses?enrollment_state=active&per_page=100"
        );

        let url = client.endpoint("courses/101/assignments/55", &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://canvas.example.edu/api/v1/courses/101/assignments/55"
        );
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let client = client("https://lms.example.edu/canvas");
        let url = client.endpoint("users/42", &[]).unwrap();
        assert_eq!(url.as_str(), "https://lms.example.edu/canvas/api/v1/users/42");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = CanvasClient::new(&CanvasSettings {
            url: "not a url".to_string(),
            user_id: "42".to_string(),
            api_key: "secret".to_string(),
        });
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn test_canvas_payloads_deserialize() {
        let courses: Vec<Course> = serde_json::from_str(
            r#"[
                {"id": 101, "name": "Linear Algebra", "course_code": "MATH 221"},
                {"id": 102, "access_restricted_by_date": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(courses[0].name, "Linear Algebra");
        assert_eq!(courses[1].name, "");

        let assignment: Assignment = serde_json::from_str(
            r#"{"id": 55, "name": "Problem Set 4", "due_at": "2024-03-10T23:30:00Z", "points_possible": 10}"#,
        )
        .unwrap();
        assert_eq!(assignment.due_at.as_deref(), Some("2024-03-10T23:30:00Z"));

        let undated: Assignment =
            serde_json::from_str(r#"{"id": 56, "name": "Reading", "due_at": null}"#).unwrap();
        assert!(undated.due_at.is_none());

        let unsubmitted: Submission =
            serde_json::from_str(r#"{"id": 9, "attempt": null, "workflow_state": "unsubmitted"}"#)
                .unwrap();
        assert!(!unsubmitted.is_submitted());

        let submitted: Submission =
            serde_json::from_str(r#"{"id": 9, "attempt": 2, "workflow_state": "submitted"}"#)
                .unwrap();
        assert!(submitted.is_submitted());
    }
}
