//! HTTP client for the organization API's JSON 1.1 protocol.
//!
//! Every operation is a `POST /` with the operation named in the
//! `X-Amz-Target` header. Requests are sent unsigned: the configured
//! endpoint is expected to take care of authentication (for example a
//! signing proxy in front of the provider).

use super::ControlPlane;
use crate::error::ControlPlaneError;
use crate::models::{
    BillingAccess, CreateAccountRequest, ParentContainer, RequestStatusSnapshot, Root, Tag,
};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use service_core::observability::outbound_trace_headers;
use std::time::Duration;

const TARGET_PREFIX: &str = "AWSOrganizationsV20161128";
const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_HEADER: &str = "X-Amz-Target";

const THROTTLING_CODES: &[&str] = &["TooManyRequestsException", "ThrottlingException"];

#[derive(Debug, Clone)]
pub struct HttpControlPlaneConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
}

#[derive(Clone)]
pub struct HttpControlPlane {
    client: Client,
    config: HttpControlPlaneConfig,
}

impl HttpControlPlane {
    pub fn new(config: HttpControlPlaneConfig) -> Result<Self, ControlPlaneError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ControlPlaneError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn call<Req, Resp>(&self, operation: &str, body: &Req) -> Result<Resp, ControlPlaneError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload =
            serde_json::to_vec(body).map_err(|e| ControlPlaneError::Decode(e.to_string()))?;

        tracing::debug!(
            operation,
            endpoint = %self.config.endpoint,
            "Calling organization API"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(outbound_trace_headers())
            .header(CONTENT_TYPE, AMZ_JSON)
            .header(TARGET_HEADER, format!("{}.{}", TARGET_PREFIX, operation))
            .body(payload)
            .send()
            .await
            .map_err(|e| ControlPlaneError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ControlPlaneError::Network(e.to_string()))?;

        if !status.is_success() {
            let err = parse_error(status.as_u16(), &bytes);
            tracing::warn!(
                operation,
                status = status.as_u16(),
                error = %err,
                "Organization API returned an error"
            );
            return Err(err);
        }

        let body: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        serde_json::from_slice(body).map_err(|e| {
            ControlPlaneError::Decode(format!("{} response: {}", operation, e))
        })
    }
}

/// Map an error response to a [`ControlPlaneError`].
///
/// The provider reports the error code in `__type`, sometimes prefixed with
/// a namespace (`com.amazonaws.organizations#AccountNotFoundException`).
pub(crate) fn parse_error(status: u16, body: &[u8]) -> ControlPlaneError {
    #[derive(Deserialize, Default)]
    struct ErrorBody {
        #[serde(rename = "__type", default)]
        error_type: Option<String>,
        #[serde(alias = "Message", default)]
        message: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let code = parsed
        .error_type
        .as_deref()
        .and_then(|t| t.rsplit('#').next())
        .filter(|c| !c.is_empty())
        .unwrap_or("UnknownError")
        .to_string();
    let message = parsed
        .message
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

    if status == 429 || THROTTLING_CODES.contains(&code.as_str()) {
        return ControlPlaneError::Throttled(message);
    }

    ControlPlaneError::Api {
        code,
        message,
        status,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateAccountInput<'a> {
    email: &'a str,
    account_name: &'a str,
    iam_user_access_to_billing: BillingAccess,
    #[serde(skip_serializing_if = "Option::is_none")]
    role_name: Option<&'a str>,
    #[serde(skip_serializing_if = "no_tags")]
    tags: &'a [Tag],
}

fn no_tags(tags: &&[Tag]) -> bool {
    tags.is_empty()
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateAccountStatusOutput {
    create_account_status: RequestStatusSnapshot,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeCreateAccountStatusInput<'a> {
    create_account_request_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListParentsInput<'a> {
    child_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListParentsOutput {
    #[serde(default)]
    parents: Vec<ParentContainer>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MoveAccountInput<'a> {
    account_id: &'a str,
    source_parent_id: &'a str,
    destination_parent_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListRootsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListRootsOutput {
    #[serde(default)]
    roots: Vec<Root>,
    #[serde(default)]
    next_token: Option<String>,
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn create_account(
        &self,
        request: &CreateAccountRequest,
    ) -> Result<String, ControlPlaneError> {
        let input = CreateAccountInput {
            email: &request.email,
            account_name: &request.account_name,
            iam_user_access_to_billing: request.billing_access,
            role_name: request.role_name.as_deref(),
            tags: &request.tags,
        };

        let output: CreateAccountStatusOutput = self.call("CreateAccount", &input).await?;
        let request_id = output.create_account_status.id;
        if request_id.is_empty() {
            return Err(ControlPlaneError::Decode(
                "CreateAccount response has no request id".to_string(),
            ));
        }

        Ok(request_id)
    }

    async fn describe_account_request(
        &self,
        request_id: &str,
    ) -> Result<RequestStatusSnapshot, ControlPlaneError> {
        let input = DescribeCreateAccountStatusInput {
            create_account_request_id: request_id,
        };
        let output: CreateAccountStatusOutput =
            self.call("DescribeCreateAccountStatus", &input).await?;

        Ok(output.create_account_status)
    }

    async fn list_parents(
        &self,
        account_id: &str,
    ) -> Result<Vec<ParentContainer>, ControlPlaneError> {
        let mut parents = Vec::new();
        let mut next_token = None;

        loop {
            let input = ListParentsInput {
                child_id: account_id,
                next_token: next_token.take(),
            };
            let page: ListParentsOutput = self.call("ListParents", &input).await?;
            parents.extend(page.parents);

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(parents)
    }

    async fn move_account(
        &self,
        account_id: &str,
        source_parent_id: &str,
        destination_parent_id: &str,
    ) -> Result<(), ControlPlaneError> {
        let input = MoveAccountInput {
            account_id,
            source_parent_id,
            destination_parent_id,
        };
        let _: serde_json::Value = self.call("MoveAccount", &input).await?;
        Ok(())
    }

    async fn list_roots(&self) -> Result<Vec<Root>, ControlPlaneError> {
        let mut roots = Vec::new();
        let mut next_token = None;

        loop {
            let input = ListRootsInput {
                next_token: next_token.take(),
            };
            let page: ListRootsOutput = self.call("ListRoots", &input).await?;
            roots.extend(page.roots);

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(roots)
    }
}
