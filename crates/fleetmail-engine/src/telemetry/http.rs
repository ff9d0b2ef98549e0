use super::TelemetrySink;
use crate::fleet::now_unix;
use fleetmail_protocol::events::{Envelope, TelemetryEvent};
use std::time::Duration;
use tracing::debug;

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts each event as an envelope on its own task; errors are logged and dropped.
#[derive(Debug, Clone)]
pub struct HttpTelemetrySink {
    client: reqwest::Client,
    url: String,
}

impl HttpTelemetrySink {
    pub fn new(url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(SUBMIT_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl TelemetrySink for HttpTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        let envelope = Envelope::new(event.name(), now_unix(), event);
        let request = self.client.post(&self.url).json(&envelope);

        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    debug!(
                        event = envelope.event_type.as_str(),
                        status = response.status().as_u16(),
                        "telemetry.submit_rejected"
                    );
                }
                Err(err) => {
                    debug!(event = envelope.event_type.as_str(), err = %err, "telemetry.submit_failed");
                }
            }
        });
    }
}
