mod ckb;
pub mod ckb_indexer;

pub use ckb::CkbRpcClient;

use std::future::Future;
use thiserror::Error;

pub(crate) fn block_on<F: Send>(future: impl Future<Output = F> + Send) -> F {
    match tokio::runtime::Handle::try_current() {
        Ok(h)
            if matches!(
                h.runtime_flavor(),
                tokio::runtime::RuntimeFlavor::MultiThread
            ) =>
        {
            tokio::task::block_in_place(|| h.block_on(future))
        }
        // inside a current-thread runtime the future must be polled from
        // another thread, blocking here would stall the reactor forever
        Ok(_) => std::thread::scope(|s| {
            s.spawn(|| new_runtime().block_on(future))
                .join()
                .expect("rpc thread panicked")
        }),
        Err(_) => new_runtime().block_on(future),
    }
}

fn new_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build tokio runtime")
}

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("parse json error: `{0}`")]
    Json(#[from] serde_json::Error),
    #[error("http error: `{0}`")]
    Http(#[from] reqwest::Error),
    #[error("jsonrpc error: `{0}`")]
    Rpc(#[from] jsonrpc_core::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[macro_export]
macro_rules! jsonrpc {
    (
        $(#[$struct_attr:meta])*
        pub struct $struct_name:ident {$(
            $(#[$attr:meta])*
            pub fn $method:ident(& $selff:ident $(, $arg_name:ident: $arg_ty:ty)*)
                -> $return_ty:ty;
        )*}
    ) => (
        $(#[$struct_attr])*
        pub struct $struct_name {
            pub(crate) client: $crate::rpc::RpcClient,
            pub(crate) id: std::sync::atomic::AtomicU64,
        }

        impl Clone for $struct_name {
            fn clone(&self) -> Self {
                Self {
                    client: self.client.clone(),
                    id: 0.into()
                }
            }
        }

        impl $struct_name {
            pub fn new(uri: &str) -> Result<Self, $crate::rpc::RpcError> {
                Ok($struct_name { id: 0.into(), client: $crate::rpc::RpcClient::new(uri)? })
            }

            pub fn url(&self) -> &str {
                self.client.url()
            }

            $(
                $(#[$attr])*
                pub fn $method(&$selff $(, $arg_name: $arg_ty)*) -> Result<$return_ty, $crate::rpc::RpcError> {
                    let method = String::from(stringify!($method));
                    let params = $crate::serialize_parameters!($($arg_name,)*);
                    let id = $selff.id.fetch_add(1, std::sync::atomic::Ordering::Relaxed);

                    let params_fn = || -> Result<_,_> {
                        let mut req_json = serde_json::Map::new();
                        req_json.insert("id".to_owned(), serde_json::json!(id));
                        req_json.insert("jsonrpc".to_owned(), serde_json::json!("2.0"));
                        req_json.insert("method".to_owned(), serde_json::json!(method));
                        req_json.insert("params".to_owned(), params);
                        Ok(req_json)
                    };

                    let task = $selff.client.post(params_fn);
                    $crate::rpc::block_on(task)
                }
            )*
        }
    )
}

#[derive(Debug, Clone)]
pub(crate) struct RpcClient {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl RpcClient {
    pub fn new(uri: &str) -> Result<Self, RpcError> {
        let url = reqwest::Url::parse(uri).map_err(|err| {
            anyhow::anyhow!(
                "invalid ckb uri `{}`: {}, e.g. \"http://127.0.0.1:8114\"",
                uri,
                err
            )
        })?;
        // every blocking call may run on its own short lived runtime, pooled
        // connections would outlive the runtime that drives them
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn post<PARAM, RET, T>(
        &self,
        json_post_params: T,
    ) -> impl std::future::Future<Output = Result<RET, crate::rpc::RpcError>>
    where
        PARAM: serde::ser::Serialize + Send + 'static,
        RET: serde::de::DeserializeOwned + Send + 'static,
        T: FnOnce() -> Result<PARAM, crate::rpc::RpcError>,
    {
        let url = self.url.clone();
        let client = self.client.clone();

        async move {
            let resp = client.post(url).json(&json_post_params()?).send().await?;
            let output = resp.json::<jsonrpc_core::response::Output>().await?;
            match output {
                jsonrpc_core::response::Output::Success(success) => {
                    serde_json::from_value(success.result).map_err(Into::into)
                }
                jsonrpc_core::response::Output::Failure(failure) => Err(failure.error.into()),
            }
        }
    }
}

#[macro_export]
macro_rules! serialize_parameters {
    () => ( serde_json::Value::Null );
    ($($arg_name:ident,)+) => ( serde_json::to_value(($($arg_name,)+))?)
}

#[cfg(test)]
mod anyhow_tests {
    use anyhow::anyhow;
    #[test]
    fn test_rpc_error() {
        let json_rpc_error = jsonrpc_core::Error {
            code: jsonrpc_core::ErrorCode::ParseError,
            message: "parse error".to_string(),
            data: None,
        };
        let error = super::RpcError::from(json_rpc_error);
        let error = anyhow!(error);
        let message = error.to_string();
        assert!(message.starts_with("jsonrpc error:"));
        assert!(message.contains("parse error"));
    }

    #[test]
    fn test_invalid_url() {
        let error = super::RpcClient::new("not a url").unwrap_err();
        assert!(error.to_string().contains("invalid ckb uri"));
    }
}
