//! Connection Factory
//!
//! Builds the single process-wide [`Client`] and only hands it out once the
//! connection is confirmed live. The confirming `ping` is raced against the
//! early-failure signals the driver surfaces (server heartbeat failure,
//! connection-checkout failure) and against an overall timeout, because an
//! unreachable host can otherwise leave the connect attempt hanging.

use std::time::Duration;

use mongodb::bson::doc;
use mongodb::event::cmap::CmapEvent;
use mongodb::event::sdam::SdamEvent;
use mongodb::event::EventHandler;
use mongodb::options::ClientOptions;
use mongodb::Client;
use tokio::sync::mpsc;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::types::ConnectionOptions;

/// Connects and resolves only when the deployment answers a `ping`.
///
/// Whichever fires first decides the outcome: ping success, a transport
/// failure signal, or the configured timeout.
#[instrument(skip(options), fields(db = ?options.db_name, timeout_ms = options.connect_timeout_ms))]
pub async fn connect(options: &ConnectionOptions) -> Result<Client> {
    let mut client_options = ClientOptions::parse(&options.url)
        .await
        .map_err(|e| Error::invalid_options(e.to_string()))?;

    let timeout_ms = options.connect_timeout_ms;
    client_options.server_selection_timeout = Some(Duration::from_millis(timeout_ms));

    let (failure_tx, mut failure_rx) = mpsc::unbounded_channel::<Error>();

    let heartbeat_tx = failure_tx.clone();
    client_options.sdam_event_handler = Some(EventHandler::callback(move |event: SdamEvent| {
        if let SdamEvent::ServerHeartbeatFailed(event) = event {
            let _ = heartbeat_tx.send(Error::heartbeat_failed(format!("{event:?}")));
        }
    }));

    client_options.cmap_event_handler = Some(EventHandler::callback(move |event: CmapEvent| {
        if let CmapEvent::ConnectionCheckoutFailed(event) = event {
            let _ = failure_tx.send(Error::connection_failed(format!(
                "connection checkout failed: {event:?}"
            )));
        }
    }));

    let client =
        Client::with_options(client_options).map_err(|e| Error::invalid_options(e.to_string()))?;

    let ping = async {
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
    };

    let outcome = tokio::select! {
        result = ping => result
            .map(|_| ())
            .map_err(|e| Error::connection_failed(e.to_string())),
        failure = failure_rx.recv() => {
            Err(failure.unwrap_or_else(|| Error::connection_failed("failure channel closed")))
        }
        () = tokio::time::sleep(Duration::from_millis(timeout_ms)) => {
            Err(Error::Timeout { timeout_ms })
        }
    };

    outcome?;
    tracing::debug!("connection confirmed live");
    Ok(client)
}
