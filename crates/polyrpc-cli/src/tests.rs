use super::*;
use serde_json::json;

#[test]
fn test_validate_http_url() {
    assert!(validate_http_url("http://127.0.0.1:9009", "server address").is_ok());
    assert!(validate_http_url("https://example.com", "server address").is_ok());

    let err = validate_http_url("127.0.0.1:9009", "server address").unwrap_err();
    assert!(err.to_string().contains("server address"));
    assert!(err.to_string().contains("http://"));
}

#[test]
fn test_parse_params() {
    assert_eq!(parse_params(None).unwrap(), None);
    assert_eq!(parse_params(Some("[2, 3]")).unwrap(), Some(json!([2, 3])));
    assert_eq!(parse_params(Some(r#"{"a": 1}"#)).unwrap(), Some(json!({"a": 1})));
    assert_eq!(parse_params(Some("\"bob\"")).unwrap(), Some(json!("bob")));
    assert!(parse_params(Some("{not json")).is_err());
}

#[test]
fn test_builtin_methods() {
    assert_eq!(Builtin::Health.method(), "_health");
    assert_eq!(Builtin::Info.method(), "_info");
    assert_eq!(Builtin::Metrics.method(), "_metrics");
}

#[test]
fn test_render() {
    let value = json!({"a": [1, 2]});
    assert_eq!(render(&value, false).unwrap(), r#"{"a":[1,2]}"#);
    assert!(render(&value, true).unwrap().contains('\n'));
}

#[tokio::test]
async fn test_call_rejects_bad_url_before_connecting() {
    let err = call("localhost:9009", "Svc_Op", None, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("must start with"));
}
