//! GrpcAnalyzerTransport - unary gRPC client for the analyzer

use contracts::{AnalyzerConfig, AnalyzerTransport, ContractError, ObservationBatch};
use http::uri::PathAndQuery;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, info, instrument};

use super::proto;

/// Transport that sends batches to the analyzer over gRPC
///
/// Each batch is one `AddObservations` call. No retries; a failed call is reported to
/// the dispatcher, which decides what happens to the batch.
pub struct GrpcAnalyzerTransport {
    name: String,
    config: AnalyzerConfig,
    channel: Option<Channel>,
}

impl GrpcAnalyzerTransport {
    /// Connect to the analyzer described by `config`
    #[instrument(name = "grpc_transport_connect", skip(config), fields(url = %config.url, tls = config.enable_tls))]
    pub async fn connect(config: AnalyzerConfig) -> Result<Self, ContractError> {
        let name = "analyzer".to_string();
        let channel = open_channel(&name, &config).await?;
        info!(url = %config.url, tls = config.enable_tls, "Connected to analyzer");

        Ok(Self {
            name,
            config,
            channel: Some(channel),
        })
    }
}

impl AnalyzerTransport for GrpcAnalyzerTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    #[instrument(
        name = "grpc_transport_send",
        skip(self, batch),
        fields(key = %batch.key, size = batch.len())
    )]
    async fn send(&mut self, batch: &ObservationBatch) -> Result<(), ContractError> {
        let Some(channel) = self.channel.clone() else {
            return Err(ContractError::TransportClosed {
                transport: self.name.clone(),
            });
        };
        if batch.is_empty() {
            return Err(ContractError::transport_send(&self.name, "empty batch"));
        }

        let mut grpc = Grpc::new(channel);
        grpc.ready()
            .await
            .map_err(|e| ContractError::transport_send(&self.name, format!("not ready: {e}")))?;

        let request = tonic::Request::new(proto::ObservationBatch::from(batch));
        let codec = ProstCodec::<proto::ObservationBatch, proto::Empty>::default();
        grpc.unary(
            request,
            PathAndQuery::from_static(proto::ADD_OBSERVATIONS_PATH),
            codec,
        )
        .await
        .map_err(|status| {
            ContractError::transport_send(
                &self.name,
                format!("{:?}: {}", status.code(), status.message()),
            )
        })?;

        debug!(key = %batch.key, size = batch.len(), "Batch accepted by analyzer");
        Ok(())
    }

    fn close(&mut self) {
        if self.channel.take().is_some() {
            debug!(transport = %self.name, "Analyzer channel released");
        }
    }

    #[instrument(name = "grpc_transport_reconnect", skip(self), fields(url = %self.config.url))]
    async fn reconnect(&mut self) -> Result<(), ContractError> {
        if self.channel.is_none() {
            self.channel = Some(open_channel(&self.name, &self.config).await?);
        }
        Ok(())
    }
}

async fn open_channel(name: &str, config: &AnalyzerConfig) -> Result<Channel, ContractError> {
    let uri = endpoint_uri(&config.url, config.enable_tls);
    let mut endpoint = Endpoint::from_shared(uri)
        .map_err(|e| ContractError::transport_connection(name, format!("invalid url: {e}")))?
        .connect_timeout(config.timeout())
        .timeout(config.timeout());

    if config.enable_tls {
        let tls = match &config.ca_file {
            Some(path) => {
                let pem = tokio::fs::read(path).await.map_err(|e| {
                    ContractError::transport_connection(
                        name,
                        format!("reading CA file {}: {e}", path.display()),
                    )
                })?;
                ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem))
            }
            None => ClientTlsConfig::new().with_native_roots(),
        };
        endpoint = endpoint
            .tls_config(tls)
            .map_err(|e| ContractError::transport_connection(name, format!("tls config: {e}")))?;
    }

    endpoint
        .connect()
        .await
        .map_err(|e| ContractError::transport_connection(name, e.to_string()))
}

/// Add a scheme to bare `host:port` urls
fn endpoint_uri(url: &str, enable_tls: bool) -> String {
    if url.contains("://") {
        return url.to_string();
    }
    let scheme = if enable_tls { "https" } else { "http" };
    format!("{scheme}://{url}")
}
