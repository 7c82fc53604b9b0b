use crate::errors::{ActionError, AppError};
use crate::models::{ActionDescriptor, HttpMethod, Payload};
use reqwest::{Client, Url};
use tracing::{debug, warn};

pub const CSRF_HEADER: &str = "X-CSRFToken";

/// What a successful action answered with.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Body not needed by the action; it is drained and dropped.
    Ignored,
    Json(serde_json::Value),
}

/// Issues one mutating (or lookup) request per call. Never retries.
#[derive(Debug, Clone)]
pub struct RemoteActionClient {
    http: Client,
    base_url: Url,
}

impl RemoteActionClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let mut base_url = Url::parse(base_url).map_err(|err| AppError::BaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::BaseUrl {
                url: base_url.to_string(),
                reason: "not a hierarchical url".to_string(),
            });
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder().build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url_for(&self, descriptor: &ActionDescriptor, entity_id: Option<&str>) -> Result<Url, ActionError> {
        let path = descriptor.path_for(entity_id).ok_or_else(|| {
            ActionError::MalformedTrigger(format!("{:?} needs an entity id", descriptor.kind))
        })?;
        // Endpoint paths are relative to the application root, not the host.
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ActionError::MalformedTrigger(format!("bad path {path}: {err}")))
    }

    /// Sends the request described by `descriptor`.
    ///
    /// `csrf_token` is whatever the page holds right now; mutating requests
    /// without one fail before anything goes on the wire.
    pub async fn send(
        &self,
        descriptor: &ActionDescriptor,
        entity_id: Option<&str>,
        payload: &Payload,
        csrf_token: Option<&str>,
    ) -> Result<ResponseBody, ActionError> {
        let url = self.url_for(descriptor, entity_id)?;
        if descriptor.method.is_mutating() && csrf_token.is_none() {
            return Err(ActionError::MissingCsrfToken);
        }

        let mut request = match descriptor.method {
            HttpMethod::Get => self.http.get(url.clone()),
            HttpMethod::Post => self.http.post(url.clone()),
        };
        if let Some(token) = csrf_token {
            request = request.header(CSRF_HEADER, token);
        }
        if let Payload::Form(fields) = payload {
            request = request.form(fields);
        }

        debug!(method = %descriptor.method, %url, "sending action request");
        let response = request
            .send()
            .await
            .map_err(|err| ActionError::NetworkFailure(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(method = %descriptor.method, %url, status = status.as_u16(), "action rejected");
            return Err(ActionError::ServerRejected(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| ActionError::NetworkFailure(err.to_string()))?;
        if !descriptor.expects_json {
            return Ok(ResponseBody::Ignored);
        }
        let value = serde_json::from_slice(&body)?;
        Ok(ResponseBody::Json(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionKind;

    #[test]
    fn url_joins_against_application_root() {
        let client = RemoteActionClient::new("http://127.0.0.1:8000/app").unwrap();
        let url = client
            .url_for(ActionKind::MarkBillPaid.descriptor(), Some("42"))
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/app/users/bill/42/mark-paid/");

        let root = RemoteActionClient::new("http://127.0.0.1:8000").unwrap();
        let url = root.url_for(ActionKind::AddBill.descriptor(), None).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/users/bill/add/");
    }

    #[test]
    fn missing_entity_id_is_malformed_trigger() {
        let client = RemoteActionClient::new("http://127.0.0.1:8000/").unwrap();
        let err = client
            .url_for(ActionKind::EditSavingsGoal.descriptor(), None)
            .unwrap_err();
        assert!(matches!(err, ActionError::MalformedTrigger(_)));
    }

    #[test]
    fn traversal_in_entity_id_is_malformed_trigger() {
        let client = RemoteActionClient::new("http://127.0.0.1:8000/").unwrap();
        let err = client
            .url_for(ActionKind::MarkBillPaid.descriptor(), Some("../../../admin/delete?x="))
            .unwrap_err();
        assert!(matches!(err, ActionError::MalformedTrigger(_)));
    }

    #[test]
    fn rejects_non_hierarchical_base() {
        assert!(RemoteActionClient::new("mailto:someone@example.com").is_err());
        assert!(RemoteActionClient::new("not a url").is_err());
    }

    #[tokio::test]
    async fn post_without_token_sends_nothing() {
        // Port 9 (discard) would fail as a network error if anything were sent.
        let client = RemoteActionClient::new("http://127.0.0.1:9/").unwrap();
        let err = client
            .send(ActionKind::MarkBillPaid.descriptor(), Some("1"), &Payload::Empty, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::MissingCsrfToken));
    }
}
