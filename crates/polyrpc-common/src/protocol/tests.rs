//! Cross-module protocol tests
//!
//! These follow an error or a call all the way through envelope encoding and
//! back, the path every request takes between client and server.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::codec::{encode_params, JsonCodec, Params};
    use serde_json::{json, Value};
    use std::collections::HashSet;

    #[test]
    fn test_request_id_uniqueness() {
        let ids: HashSet<_> = (0..1000)
            .map(|_| JsonRpcRequest::new("test", None).id.to_string())
            .collect();
        assert_eq!(ids.len(), 1000, "All request IDs should be unique");
    }

    #[test]
    fn test_call_survives_envelope_encoding() {
        let request = JsonRpcRequest::with_id(
            "SampleService_Add",
            encode_params(vec![json!(2), json!(3)]),
            json!(17),
        );
        let bytes = JsonCodec::encode_request(&request).unwrap();
        let decoded = JsonCodec::decode_request(&bytes).unwrap();
        assert_eq!(decoded, request);

        let mut params = Params::parse(&["a", "b"], decoded.params).unwrap();
        let sum = params.take::<i64>().unwrap() + params.take::<i64>().unwrap();
        assert_eq!(sum, 5);
    }

    #[test]
    fn test_application_error_survives_envelope_encoding() {
        let err = RpcError::application(393, "this is a note");
        let bytes = JsonCodec::encode_response(&JsonRpcResponse::error(json!(1), err.to_jsonrpc()));
        let response = JsonCodec::decode_response(&bytes).unwrap();
        let remote = RpcError::from(response.into_result().unwrap_err());
        assert_eq!(remote, err);
    }

    #[test]
    fn test_error_body_layout() {
        let response = JsonRpcResponse::error(Value::Null, RpcError::parse_error("eof").to_jsonrpc());
        let body: Value = serde_json::from_slice(&JsonCodec::encode_response(&response)).unwrap();
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["error"]["code"], -32700);
        assert!(body["error"]["message"].as_str().unwrap().starts_with("Parse error"));
    }

    #[test]
    fn test_request_from_foreign_peer() {
        // No version, keyword arguments, string id
        let body = br#"{"method":"SampleService_Add","params":{"a":1,"b":2},"id":"x-1"}"#;
        let request = JsonCodec::decode_request(body).unwrap();
        assert_eq!(request.jsonrpc, "2.0");
        assert_eq!(request.id, json!("x-1"));
        assert!(Params::parse(&["a", "b"], request.params).is_ok());
    }
}
