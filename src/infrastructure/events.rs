use crate::domain::events::DomainEvent;

/// Publishes domain events to NATS when a client is configured.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self {
        Self { nats }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::disabled() };
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(%url, "connected to NATS");
                Self::new(Some(client))
            }
            Err(err) => {
                tracing::warn!(%url, ?err, "NATS unavailable, events will only be logged");
                Self::disabled()
            }
        }
    }

    /// Publishing failures are logged and never fail the request.
    pub async fn publish(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events {
            let subject = event.subject();
            let Some(nats) = &self.nats else {
                tracing::debug!(%subject, ?event, "event");
                continue;
            };
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::warn!(%subject, ?err, "event_encode_err");
                    continue;
                }
            };
            if let Err(err) = nats.publish(subject.clone(), payload.into()).await {
                tracing::warn!(%subject, ?err, "event_publish_err");
            }
        }
    }
}
