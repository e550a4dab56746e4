//! Macros for declaring services and the records they exchange.
//!
//! - [`rpc_record!`]: structs with the derives the codec needs
//! - [`rpc_service!`]: a service trait plus its client stub and dispatcher
//!
//! # Example
//!
//! ```rust
//! use polyrpc::{rpc_record, rpc_service, RpcError};
//!
//! rpc_record! {
//!     /// A point on the plane
//!     pub struct Point {
//!         pub x: i64,
//!         pub y: i64,
//!     }
//! }
//!
//! rpc_service! {
//!     /// Geometry helpers
//!     pub service Geometry {
//!         client: GeometryClient,
//!         dispatcher: GeometryDispatcher,
//!
//!         /// Adds two points
//!         "Add" => fn add(a: Point, b: Point) -> Point;
//!         /// Forgets everything
//!         "Reset" => fn reset();
//!     }
//! }
//!
//! struct Plane;
//!
//! impl Geometry for Plane {
//!     async fn add(&self, a: Point, b: Point) -> Result<Point, RpcError> {
//!         Ok(Point { x: a.x + b.x, y: a.y + b.y })
//!     }
//!
//!     async fn reset(&self) -> Result<(), RpcError> {
//!         Ok(())
//!     }
//! }
//!
//! assert_eq!(GeometryDispatcher::<Plane>::METHODS[0].name, "Geometry_Add");
//! ```

/// Define record types exchanged by services.
///
/// Adds `#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]`
/// and `#[serde(default, deny_unknown_fields)]` to each struct, so a peer that
/// leaves a field out still decodes with that field defaulted, while an object
/// carrying fields the record does not declare fails to decode. The calling
/// crate needs `serde` as a dependency.
///
/// # Example
///
/// ```rust
/// use polyrpc::rpc_record;
///
/// rpc_record! {
///     pub struct SampleResult {
///         pub success: bool,
///         pub code: i32,
///         pub note: String,
///     }
/// }
///
/// let partial: SampleResult = serde_json::from_str(r#"{"code": 393}"#).unwrap();
/// assert_eq!(partial.code, 393);
/// assert!(!partial.success);
///
/// assert!(serde_json::from_str::<SampleResult>(r#"{"name": "x"}"#).is_err());
/// ```
#[macro_export]
macro_rules! rpc_record {
    (
        $(
            $(#[$meta:meta])*
            $vis:vis struct $name:ident {
                $(
                    $(#[$field_meta:meta])*
                    $field_vis:vis $field:ident : $ty:ty
                ),* $(,)?
            }
        )*
    ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
            #[serde(default, deny_unknown_fields)]
            $vis struct $name {
                $(
                    $(#[$field_meta])*
                    $field_vis $field : $ty,
                )*
            }
        )*
    };
}

/// Define a service.
///
/// Each operation is declared with its wire name, the Rust method name, its
/// parameters and an optional return type. On the wire an operation is called
/// `<Service>_<WireName>`. A service declares at least one operation.
///
/// This macro generates:
/// - A trait with the service name, one method per operation
/// - A client stub implementing that trait over an [`RpcClient`](crate::RpcClient)
/// - A dispatcher implementing [`Dispatch`](crate::Dispatch) for any
///   implementation of the trait, with `SERVICE_NAME` and `METHODS` constants
///
/// # Example
///
/// ```rust
/// use polyrpc::{rpc_service, RpcError};
/// use std::sync::atomic::{AtomicI64, Ordering};
///
/// rpc_service! {
///     pub service Counter {
///         client: CounterClient,
///         dispatcher: CounterDispatcher,
///
///         "Bump" => fn bump(by: i64) -> i64;
///     }
/// }
///
/// #[derive(Default)]
/// struct Local(AtomicI64);
///
/// impl Counter for Local {
///     async fn bump(&self, by: i64) -> Result<i64, RpcError> {
///         Ok(self.0.fetch_add(by, Ordering::SeqCst) + by)
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = CounterDispatcher::new(Local::default()).into_local_client();
/// assert_eq!(client.bump(2).await.unwrap(), 2);
/// assert_eq!(client.bump(3).await.unwrap(), 5);
/// # }
/// ```
///
/// A service without operations is rejected:
///
/// ```compile_fail
/// polyrpc::rpc_service! {
///     pub service Empty {
///         client: EmptyClient,
///         dispatcher: EmptyDispatcher,
///     }
/// }
/// ```
#[macro_export]
macro_rules! rpc_service {
    (
        $(#[$meta:meta])*
        $vis:vis service $service:ident {
            client: $client:ident,
            dispatcher: $dispatcher:ident,

            $(
                $(#[$op_meta:meta])*
                $wire:literal => fn $op:ident ( $( $arg:ident : $ty:ty ),* $(,)? ) $( -> $ret:ty )? ;
            )+
        }
    ) => {
        $(#[$meta])*
        ///
        /// Calls arrive concurrently from any number of connections and the
        /// framework adds no locking around the implementation, so
        /// implementations must synchronize their own state.
        $vis trait $service: ::core::marker::Send + ::core::marker::Sync + 'static {
            $(
                $(#[$op_meta])*
                fn $op(&self $(, $arg: $ty)*) -> impl ::core::future::Future<
                    Output = ::core::result::Result<$crate::__rpc_return!($($ret)?), $crate::RpcError>,
                > + ::core::marker::Send;
            )*
        }

        #[doc = concat!("Client stub for [`", stringify!($service), "`].")]
        ///
        /// Cloning is cheap; clones share the underlying transport.
        $vis struct $client<T: $crate::Transport = $crate::HttpTransport> {
            client: $crate::RpcClient<T>,
        }

        impl<T: $crate::Transport> ::core::clone::Clone for $client<T> {
            fn clone(&self) -> Self {
                Self::new(self.client.clone())
            }
        }

        impl<T: $crate::Transport> ::core::fmt::Debug for $client<T> {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_tuple(stringify!($client)).field(&self.client).finish()
            }
        }

        impl $client<$crate::HttpTransport> {
            /// Create a stub for the server at `url` (`http://<host>:<port>`).
            pub fn connect(url: &str) -> $crate::Result<Self> {
                ::core::result::Result::Ok(Self::new($crate::RpcClient::connect(url)?))
            }

            pub fn connect_with_config(url: &str, config: $crate::ClientConfig) -> $crate::Result<Self> {
                ::core::result::Result::Ok(Self::new($crate::RpcClient::connect_with_config(url, config)?))
            }
        }

        impl<T: $crate::Transport> $client<T> {
            pub fn new(client: $crate::RpcClient<T>) -> Self {
                Self { client }
            }

            pub fn rpc(&self) -> &$crate::RpcClient<T> {
                &self.client
            }
        }

        impl<T: $crate::Transport> $service for $client<T> {
            $(
                async fn $op(&self $(, $arg: $ty)*) -> ::core::result::Result<$crate::__rpc_return!($($ret)?), $crate::RpcError> {
                    let args: ::std::vec::Vec<$crate::__private::Value> =
                        ::std::vec![$($crate::__private::codec::encode(&$arg)?),*];
                    $crate::__rpc_client_call!(
                        self.client,
                        concat!(stringify!($service), "_", $wire),
                        args;
                        $($ret)?
                    )
                }
            )*
        }

        #[doc = concat!("Serves any [`", stringify!($service), "`] implementation.")]
        $vis struct $dispatcher<S> {
            service: ::std::sync::Arc<S>,
        }

        impl<S> $dispatcher<S> {
            pub const SERVICE_NAME: &'static str = stringify!($service);

            pub const METHODS: &'static [$crate::MethodInfo] = &[
                $(
                    $crate::MethodInfo {
                        name: concat!(stringify!($service), "_", $wire),
                        params: &[$(stringify!($arg)),*],
                        returns: $crate::__rpc_return_name!($($ret)?),
                    },
                )*
            ];

            pub fn new(service: S) -> Self {
                Self::from_arc(::std::sync::Arc::new(service))
            }

            pub fn from_arc(service: ::std::sync::Arc<S>) -> Self {
                Self { service }
            }

            pub fn service(&self) -> &S {
                &self.service
            }
        }

        impl<S: $service> $dispatcher<S> {
            /// HTTP server bound to this implementation.
            pub fn into_http_server(self) -> $crate::HttpServer {
                $crate::HttpServer::new($crate::Dispatcher::new(self))
            }

            /// Client stub calling this implementation in-process.
            pub fn into_local_client(self) -> $client<$crate::LocalTransport> {
                $client::new($crate::RpcClient::new($crate::LocalTransport::new($crate::Dispatcher::new(self))))
            }
        }

        impl<S> ::core::clone::Clone for $dispatcher<S> {
            fn clone(&self) -> Self {
                Self::from_arc(::std::sync::Arc::clone(&self.service))
            }
        }

        impl<S: $service> $crate::Dispatch for $dispatcher<S> {
            fn service_name(&self) -> &'static str {
                Self::SERVICE_NAME
            }

            fn methods(&self) -> &'static [$crate::MethodInfo] {
                Self::METHODS
            }

            #[allow(unused_mut)]
            fn dispatch(
                &self,
                method: &str,
                params: ::core::option::Option<$crate::__private::Value>,
            ) -> $crate::__private::BoxFuture<'static, ::core::result::Result<$crate::__private::Value, $crate::RpcError>> {
                let service = ::std::sync::Arc::clone(&self.service);
                $(
                    if method == concat!(stringify!($service), "_", $wire) {
                        return ::std::boxed::Box::pin(async move {
                            let mut params = $crate::__private::codec::Params::parse(&[$(stringify!($arg)),*], params)?;
                            $( let $arg: $ty = params.take()?; )*
                            let value = service.$op($($arg),*).await?;
                            $crate::__rpc_encode_result!(value; $($ret)?)
                        });
                    }
                )*
                let method = method.to_string();
                ::std::boxed::Box::pin(async move {
                    ::core::result::Result::Err::<$crate::__private::Value, _>($crate::RpcError::method_not_found(&method))
                })
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __rpc_return {
    () => { () };
    ($ret:ty) => { $ret };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __rpc_return_name {
    () => { "()" };
    ($ret:ty) => { stringify!($ret) };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __rpc_client_call {
    ($client:expr, $method:expr, $args:expr;) => {
        $client.call_void($method, $args).await
    };
    ($client:expr, $method:expr, $args:expr; $ret:ty) => {
        $client.call::<$ret>($method, $args).await
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __rpc_encode_result {
    ($value:expr;) => {{
        let () = $value;
        ::core::result::Result::Ok($crate::__private::codec::void_result())
    }};
    ($value:expr; $ret:ty) => {
        $crate::__private::codec::encode::<$ret>(&$value)
    };
}

#[cfg(test)]
#[allow(dead_code)]
mod tests {
    use crate::{Dispatch, ErrorKind, RpcError};
    use serde_json::json;
    use std::collections::HashMap;

    rpc_record! {
        /// Test record
        pub struct Tag {
            pub label: String,
            pub weight: i32,
        }

        /// Record whose only field shares the parameter name
        pub struct Settings {
            pub settings: HashMap<String, String>,
        }
    }

    rpc_service! {
        /// Test service
        pub service Tagger {
            client: TaggerClient,
            dispatcher: TaggerDispatcher,

            "Make" => fn make(label: String, weight: i32) -> Tag;
            "Index" => fn index(labels: Vec<String>) -> HashMap<String, String>;
            "Count" => fn count() -> u64;
            "Drop" => fn drop_all();
            "Apply" => fn apply(settings: Settings) -> Settings;
        }
    }

    struct Impl;

    impl Tagger for Impl {
        async fn make(&self, label: String, weight: i32) -> Result<Tag, RpcError> {
            Ok(Tag { label, weight })
        }

        async fn index(&self, labels: Vec<String>) -> Result<HashMap<String, String>, RpcError> {
            Ok(labels.into_iter().enumerate().map(|(i, l)| (l, i.to_string())).collect())
        }

        async fn count(&self) -> Result<u64, RpcError> {
            Ok(7)
        }

        async fn drop_all(&self) -> Result<(), RpcError> {
            Ok(())
        }

        async fn apply(&self, settings: Settings) -> Result<Settings, RpcError> {
            Ok(settings)
        }
    }

    #[test]
    fn test_rpc_record_defaults_missing_fields() {
        let tag: Tag = serde_json::from_value(json!({"label": "x"})).unwrap();
        assert_eq!(tag, Tag { label: "x".to_string(), weight: 0 });
    }

    #[test]
    fn test_rpc_record_rejects_unknown_fields() {
        let err = crate::__private::codec::decode::<Tag>(json!({"note": "x", "code": 1})).unwrap_err();
        assert!(err.expected().ends_with("Tag"));
        assert!(err.to_string().contains("note"));
    }

    #[test]
    fn test_method_table() {
        let methods = TaggerDispatcher::<Impl>::METHODS;
        assert_eq!(TaggerDispatcher::<Impl>::SERVICE_NAME, "Tagger");
        assert_eq!(methods.len(), 5);
        assert_eq!(methods[0].name, "Tagger_Make");
        assert_eq!(methods[0].params, &["label", "weight"]);
        assert_eq!(methods[0].returns, "Tag");
        assert_eq!(methods[3].name, "Tagger_Drop");
        assert_eq!(methods[3].returns, "()");
        assert!(methods[2].params.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_decodes_and_encodes() {
        let dispatcher = TaggerDispatcher::new(Impl);

        let made = dispatcher.dispatch("Tagger_Make", Some(json!(["a", 3]))).await.unwrap();
        assert_eq!(made, json!({"label": "a", "weight": 3}));

        // A single list argument may come bare or wrapped
        let bare = dispatcher.dispatch("Tagger_Index", Some(json!(["p", "q"]))).await.unwrap();
        let wrapped = dispatcher.dispatch("Tagger_Index", Some(json!([["p", "q"]]))).await.unwrap();
        assert_eq!(bare, json!({"p": "0", "q": "1"}));
        assert_eq!(bare, wrapped);

        assert_eq!(dispatcher.dispatch("Tagger_Count", None).await.unwrap(), json!(7));
        assert_eq!(dispatcher.dispatch("Tagger_Drop", None).await.unwrap(), json!(true));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_bad_calls() {
        let dispatcher = TaggerDispatcher::new(Impl);

        let err = dispatcher.dispatch("Tagger_Nope", None).await.unwrap_err();
        assert_eq!(err.code(), -32601);

        let err = dispatcher.dispatch("Tagger_Make", Some(json!(["a"]))).await.unwrap_err();
        assert_eq!(err.code(), -32602);

        let err = dispatcher.dispatch("Tagger_Make", Some(json!(["a", "heavy"]))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(err.message().contains("weight"));

        // An object of another record's shape is not a Settings
        let err = dispatcher
            .dispatch("Tagger_Apply", Some(json!({"label": "a", "weight": 3})))
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32602);
        assert!(err.message().contains("settings"));
    }

    #[tokio::test]
    async fn test_single_field_record_named_like_parameter() {
        let client = TaggerDispatcher::new(Impl).into_local_client();

        let mut settings = Settings::default();
        settings.settings.insert("k".to_string(), "v".to_string());
        assert_eq!(client.apply(settings.clone()).await.unwrap(), settings);

        // Keyword form from other peers still works
        let dispatcher = TaggerDispatcher::new(Impl);
        let keyed = dispatcher
            .dispatch("Tagger_Apply", Some(json!({"settings": {"settings": {"k": "v"}}})))
            .await
            .unwrap();
        assert_eq!(keyed, json!({"settings": {"k": "v"}}));
    }

    #[tokio::test]
    async fn test_local_client_round_trip() {
        let client = TaggerDispatcher::new(Impl).into_local_client();

        let tag = client.make("b".to_string(), 9).await.unwrap();
        assert_eq!(tag, Tag { label: "b".to_string(), weight: 9 });
        assert_eq!(client.count().await.unwrap(), 7);
        client.drop_all().await.unwrap();

        let index = client.index(vec!["only".to_string()]).await.unwrap();
        assert_eq!(index.get("only").map(String::as_str), Some("0"));
    }
}
