use crate::config::DongleConfig;
use crate::error::{HelioError, Result};
use crate::protocol::{InverterSnapshot, RegisterDecoder};
use std::time::Duration;

/// Raw request/response exchange with the dongle
#[async_trait::async_trait]
pub trait DongleTransport: Send + Sync {
    /// Issue `ReadRealTimeData` and return the response body
    async fn read_realtime_data(&self, serial: &str) -> Result<String>;
}

/// reqwest-backed transport for the dongle's local HTTP endpoint
pub struct HttpDongleTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpDongleTransport {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &DongleConfig) -> Result<Self> {
        Self::new(&config.url, Duration::from_millis(config.timeout_ms))
    }

    fn transport_error(err: reqwest::Error) -> HelioError {
        if err.is_timeout() {
            HelioError::timeout(err.to_string())
        } else {
            HelioError::connection(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl DongleTransport for HttpDongleTransport {
    async fn read_realtime_data(&self, serial: &str) -> Result<String> {
        let resp = self
            .client
            .post(&self.url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(format!("optType=ReadRealTimeData&pwd={}", serial))
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HelioError::http(status.as_u16()));
        }
        resp.text().await.map_err(Self::transport_error)
    }
}

/// Polls one dongle and decodes its answers
pub struct DongleClient {
    transport: Box<dyn DongleTransport>,
    decoder: RegisterDecoder,
    serial: String,
}

impl DongleClient {
    pub fn new(transport: Box<dyn DongleTransport>, serial: impl Into<String>) -> Self {
        Self {
            transport,
            decoder: RegisterDecoder::new(),
            serial: serial.into(),
        }
    }

    pub fn from_config(config: &DongleConfig, serial: impl Into<String>) -> Result<Self> {
        let transport = HttpDongleTransport::from_config(config)?;
        Ok(Self::new(Box::new(transport), serial))
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub async fn fetch_snapshot(&self) -> Result<InverterSnapshot> {
        let body = self.transport.read_realtime_data(&self.serial).await?;
        self.decoder.decode_response(&body, &self.serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedTransport(Result<String>);

    #[async_trait::async_trait]
    impl DongleTransport for CannedTransport {
        async fn read_realtime_data(&self, _serial: &str) -> Result<String> {
            match &self.0 {
                Ok(body) => Ok(body.clone()),
                Err(e) => Err(HelioError::connection(e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn transport_errors_pass_through() {
        let client = DongleClient::new(
            Box::new(CannedTransport(Err(HelioError::connection("down")))),
            "SX1",
        );
        let err = client.fetch_snapshot().await.unwrap_err();
        assert_eq!(err.status_code(), -1);
    }

    #[tokio::test]
    async fn body_without_data_is_protocol_error() {
        let client = DongleClient::new(
            Box::new(CannedTransport(Ok(r#"{"sn":"SX1"}"#.to_string()))),
            "SX1",
        );
        let err = client.fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, HelioError::Protocol { .. }));
        assert_eq!(client.serial(), "SX1");
    }
}
