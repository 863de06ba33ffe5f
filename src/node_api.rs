//! Queries against a node's local JSON-RPC API
//!
//! Requests are posted with `curl` on the node itself, over the ssh
//! transport. Replies are decoded into typed envelopes right here, so callers
//! only ever see plain values or a [`fleet::Error::Parse`].

use crate::transport::{SshTransport, shell_quote};
use fleet::{Error, Host, NodeResult, NodeVersions};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Chain whose bootstrap state decides "bootstrapped to the primary network"
const PRIMARY_CHAIN: &str = "P";

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BootstrappedReply {
    is_bootstrapped: bool,
}

#[derive(Debug, Deserialize)]
struct HealthReply {
    healthy: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeVersionReply {
    #[serde(default)]
    version: String,
    #[serde(default)]
    vm_versions: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct BlockchainStatusReply {
    status: String,
}

/// Decode a JSON-RPC reply body
pub fn decode<T: DeserializeOwned>(method: &str, raw: &str) -> NodeResult<T> {
    let envelope: RpcEnvelope<T> = serde_json::from_str(raw)
        .map_err(|e| Error::parse(format!("{method}: invalid reply: {e}")))?;

    if let Some(err) = envelope.error {
        return Err(Error::parse(format!(
            "{method}: error {}: {}",
            err.code, err.message
        )));
    }

    envelope
        .result
        .ok_or_else(|| Error::parse(format!("{method}: reply has no result")))
}

/// Request body for a JSON-RPC call
pub fn request_body(method: &str, params: &Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    })
    .to_string()
}

/// Typed client for one node API endpoint layout
pub struct NodeApi<'a> {
    transport: &'a SshTransport,
    api_url: String,
}

impl<'a> NodeApi<'a> {
    pub fn new(transport: &'a SshTransport, api_url: impl Into<String>) -> Self {
        Self {
            transport,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Remote `curl` invocation for a call
    pub fn command(&self, endpoint: &str, method: &str, params: &Value) -> String {
        format!(
            "curl -s -X POST -H 'content-type:application/json' --data {} {}/ext/{}",
            shell_quote(&request_body(method, params)),
            self.api_url,
            endpoint
        )
    }

    fn call<T: DeserializeOwned>(
        &self,
        host: &Host,
        endpoint: &str,
        method: &str,
        params: &Value,
    ) -> NodeResult<T> {
        let raw = self
            .transport
            .run(host, &self.command(endpoint, method, params))?;
        decode(method, &raw)
    }

    /// Whether the primary network chain finished bootstrapping
    pub fn is_bootstrapped(&self, host: &Host) -> NodeResult<bool> {
        let reply: BootstrappedReply = self.call(
            host,
            "info",
            "info.isBootstrapped",
            &json!({ "chain": PRIMARY_CHAIN }),
        )?;
        Ok(reply.is_bootstrapped)
    }

    pub fn is_healthy(&self, host: &Host) -> NodeResult<bool> {
        let reply: HealthReply = self.call(host, "health", "health.health", &json!({}))?;
        Ok(reply.healthy)
    }

    /// Runtime, engine and plugin versions the node reports
    pub fn node_versions(&self, host: &Host) -> NodeResult<NodeVersions> {
        let reply: NodeVersionReply =
            self.call(host, "info", "info.getNodeVersion", &json!({}))?;
        log::debug!("{}: reports {}", host.id, reply.version);
        NodeVersions::from_components(reply.vm_versions)
    }

    /// Raw status of a blockchain as the node sees it (e.g. "Validating")
    pub fn blockchain_status(&self, host: &Host, blockchain_id: &str) -> NodeResult<String> {
        let reply: BlockchainStatusReply = self.call(
            host,
            "P",
            "platform.getBlockchainStatus",
            &json!({ "blockchainID": blockchain_id }),
        )?;
        Ok(reply.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SshConfig;

    #[test]
    fn test_decode_bootstrapped() {
        let reply: BootstrappedReply = decode(
            "info.isBootstrapped",
            r#"{"jsonrpc":"2.0","result":{"isBootstrapped":true},"id":1}"#,
        )
        .unwrap();
        assert!(reply.is_bootstrapped);
    }

    #[test]
    fn test_decode_node_versions() {
        let reply: NodeVersionReply = decode(
            "info.getNodeVersion",
            r#"{"jsonrpc":"2.0","id":1,"result":{
                "version":"luxd/1.10.12",
                "vmVersions":{"platform":"v1.10.12","avm":"v1.10.12","evm":"v0.12.5",
                              "srEXiWaHuhNyGwPUi444Tu47ZEDwxTWrbQiuD7FmgSAQ6X7Dy":"v0.5.6"}}}"#,
        )
        .unwrap();
        let versions = NodeVersions::from_components(reply.vm_versions).unwrap();

        assert_eq!(versions.runtime, "v1.10.12");
        assert_eq!(versions.standard.len(), 2);
        assert_eq!(
            versions
                .plugins
                .get("srEXiWaHuhNyGwPUi444Tu47ZEDwxTWrbQiuD7FmgSAQ6X7Dy")
                .map(String::as_str),
            Some("v0.5.6")
        );
    }

    #[test]
    fn test_decode_rpc_error() {
        let err = decode::<HealthReply>(
            "health.health",
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
        )
        .unwrap_err();

        assert_eq!(
            err,
            Error::parse("health.health: error -32601: method not found")
        );
    }

    #[test]
    fn test_decode_missing_result_and_garbage() {
        let err = decode::<HealthReply>("health.health", r#"{"jsonrpc":"2.0","id":1}"#)
            .unwrap_err();
        assert_eq!(err, Error::parse("health.health: reply has no result"));

        let err = decode::<HealthReply>("health.health", "curl: (7) Failed to connect")
            .unwrap_err();
        assert_eq!(err.category(), fleet::ErrorCategory::Parse);
    }

    #[test]
    fn test_command() {
        let transport = SshTransport::new(SshConfig::default());
        let api = NodeApi::new(&transport, "http://127.0.0.1:9650/");

        let command = api.command("info", "info.isBootstrapped", &json!({ "chain": "P" }));

        assert!(command.starts_with("curl -s -X POST"));
        assert!(command.ends_with("http://127.0.0.1:9650/ext/info"));
        assert!(command.contains(r#""method":"info.isBootstrapped""#));
    }
}
