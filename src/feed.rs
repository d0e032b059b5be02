use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use url::Url;

use crate::model::PushFrame;

#[derive(Debug)]
pub enum FeedEvent {
    Connected,
    Disconnected,
    Frame(PushFrame),
}

// Owns the push connection for the life of the view. Reconnects with capped
// exponential backoff; a closed event channel means the view is gone and the
// loop ends. Malformed frames are dropped here, never forwarded.
pub async fn feed_loop(ws_url: Url, tx: mpsc::Sender<FeedEvent>) {
    let mut backoff = Duration::from_secs(1);
    loop {
        match connect_async(ws_url.clone()).await {
            Ok((mut ws, _)) => {
                backoff = Duration::from_secs(1);
                if tx.send(FeedEvent::Connected).await.is_err() {
                    let _ = ws.close(None).await;
                    return;
                }
                while let Some(msg) = ws.next().await {
                    match msg {
                        Ok(Message::Text(text)) => {
                            if let Some(frame) = parse_frame(&text) {
                                if tx.send(FeedEvent::Frame(frame)).await.is_err() {
                                    let _ = ws.close(None).await;
                                    return;
                                }
                            }
                        }
                        Ok(Message::Close(_)) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                let _ = ws.close(None).await;
                if tx.send(FeedEvent::Disconnected).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                debug!(event = "push_connect_error", url = %ws_url, error = %err);
            }
        }
        tokio::time::sleep(backoff).await;
        backoff = next_backoff(backoff);
    }
}

fn parse_frame(text: &str) -> Option<PushFrame> {
    match serde_json::from_str(text) {
        Ok(frame) => Some(frame),
        Err(err) => {
            warn!(event = "push_frame_parse_error", error = %err);
            None
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    let next = current + current;
    if next > Duration::from_secs(10) {
        Duration::from_secs(10)
    } else {
        next
    }
}
