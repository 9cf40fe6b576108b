use account_service::error::ControlPlaneError;
use account_service::models::{CreateAccountRequest, ParentContainer, ParentType, Tag};
use account_service::services::control_plane::http::{HttpControlPlane, HttpControlPlaneConfig};
use account_service::services::ControlPlane;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpControlPlane {
    HttpControlPlane::new(HttpControlPlaneConfig {
        endpoint: server.uri(),
        request_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn create_account_sends_expected_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(header("x-amz-target", "AWSOrganizationsV20161128.CreateAccount"))
        .and(body_partial_json(json!({
            "Email": "dev@example.com",
            "AccountName": "Atlas",
            "IamUserAccessToBilling": "DENY",
            "RoleName": "OrganizationAccountAccessRole",
            "Tags": [{"Key": "team", "Value": "core"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CreateAccountStatus": {
                "Id": "car-0123456789abcdef",
                "AccountName": "Atlas",
                "State": "IN_PROGRESS",
                "RequestedTimestamp": 1700000000.5
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateAccountRequest::new("dev@example.com", "Atlas")
        .with_role_name("OrganizationAccountAccessRole")
        .with_tags(vec![Tag::new("team", "core")])
        .with_billing_access(account_service::models::BillingAccess::Deny);

    let request_id = client(&server).create_account(&request).await.unwrap();

    assert_eq!(request_id, "car-0123456789abcdef");
}

#[tokio::test]
async fn describe_status_parses_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header(
            "x-amz-target",
            "AWSOrganizationsV20161128.DescribeCreateAccountStatus",
        ))
        .and(body_partial_json(json!({ "CreateAccountRequestId": "car-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CreateAccountStatus": {
                "Id": "car-1",
                "AccountName": "Atlas",
                "State": "SUCCEEDED",
                "AccountId": "111122223333",
                "RequestedTimestamp": 1700000000.0,
                "CompletedTimestamp": 1700000090.25
            }
        })))
        .mount(&server)
        .await;

    let snapshot = client(&server)
        .describe_account_request("car-1")
        .await
        .unwrap();

    assert_eq!(snapshot.id, "car-1");
    assert_eq!(snapshot.state, "SUCCEEDED");
    assert_eq!(snapshot.account_id.as_deref(), Some("111122223333"));
    let completed = snapshot.completed_timestamp.unwrap();
    assert_eq!(completed.timestamp_millis(), 1_700_000_090_250);
}

#[tokio::test]
async fn list_parents_follows_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSOrganizationsV20161128.ListParents"))
        .and(body_partial_json(json!({
            "ChildId": "111122223333",
            "NextToken": "page-2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Parents": [{"Id": "ou-b", "Type": "ORGANIZATIONAL_UNIT"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSOrganizationsV20161128.ListParents"))
        .and(body_partial_json(json!({ "ChildId": "111122223333" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Parents": [{"Id": "r-ab12", "Type": "ROOT"}],
            "NextToken": "page-2"
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    let parents = client(&server).list_parents("111122223333").await.unwrap();

    assert_eq!(
        parents,
        vec![
            ParentContainer::root("r-ab12"),
            ParentContainer::organizational_unit("ou-b"),
        ]
    );
    assert_eq!(parents[1].parent_type, ParentType::OrganizationalUnit);
}

#[tokio::test]
async fn move_account_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSOrganizationsV20161128.MoveAccount"))
        .and(body_partial_json(json!({
            "AccountId": "111122223333",
            "SourceParentId": "ou-x",
            "DestinationParentId": "ou-y"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .move_account("111122223333", "ou-x", "ou-y")
        .await
        .unwrap();
}

#[tokio::test]
async fn list_roots_parses_roots() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSOrganizationsV20161128.ListRoots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Roots": [{
                "Id": "r-ab12",
                "Arn": "arn:aws:organizations::111111111111:root/o-example/r-ab12",
                "Name": "Root",
                "PolicyTypes": []
            }]
        })))
        .mount(&server)
        .await;

    let roots = client(&server).list_roots().await.unwrap();

    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, "r-ab12");
    assert_eq!(roots[0].name.as_deref(), Some("Root"));
}

#[tokio::test]
async fn api_errors_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSOrganizationsV20161128.MoveAccount"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "com.amazonaws.organizations#DuplicateAccountException",
            "Message": "That account is already present in the specified destination."
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSOrganizationsV20161128.ListRoots"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSOrganizationsV20161128.ListParents"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "TooManyRequestsException",
            "message": "Rate exceeded"
        })))
        .mount(&server)
        .await;

    let client = client(&server);

    let err = client
        .move_account("111122223333", "ou-x", "ou-y")
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("DuplicateAccountException"));
    assert!(!err.is_transient());

    let err = client.list_roots().await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(
        err,
        ControlPlaneError::Api {
            code: "UnknownError".to_string(),
            message: "Service Unavailable".to_string(),
            status: 503,
        }
    );

    let err = client.list_parents("111122223333").await.unwrap_err();
    assert_eq!(err, ControlPlaneError::Throttled("Rate exceeded".to_string()));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    let client = HttpControlPlane::new(HttpControlPlaneConfig {
        endpoint: "http://127.0.0.1:9".to_string(),
        request_timeout: Duration::from_secs(2),
    })
    .unwrap();

    let err = client.list_roots().await.unwrap_err();

    assert!(matches!(err, ControlPlaneError::Network(_)));
    assert!(err.is_transient());
}
