//! Live-reload: the `/__reload` SSE endpoint and the subscriber registry
//! notified by the filesystem watcher after every rebuild.

use std::convert::Infallible;
use std::sync::Mutex;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Marker just before `</body>` that live-reload injection is idempotent
/// against: if already present (e.g. a cached render), it is not
/// duplicated.
const RELOAD_SCRIPT: &str = r#"<script>
(function () {
  var es = new EventSource("/__reload");
  es.onmessage = function (e) {
    if (e.data === "reload") {
      window.location.reload();
    }
  };
  es.onerror = function () {
    setTimeout(function () { window.location.reload(); }, 1000);
  };
})();
</script>"#;

/// Registry of connected browsers' single-slot reload channels. A full
/// channel means the subscriber already has a pending reload event
/// queued, so the new one is dropped for that subscriber rather than
/// blocking the watcher.
#[derive(Default)]
pub struct Subscribers {
    senders: Mutex<Vec<mpsc::Sender<()>>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::Receiver<()> {
        let (tx, rx) = mpsc::channel(1);
        self.senders.lock().unwrap().push(tx);
        rx
    }

    /// Notifies every connected subscriber, best-effort. A full channel
    /// means a reload is already pending for that subscriber, so the new
    /// notification is simply dropped rather than blocking; a closed
    /// channel means the browser disconnected and is pruned.
    pub fn notify_all(&self) {
        let mut senders = self.senders.lock().unwrap();
        senders.retain(|tx| !matches!(tx.try_send(()), Err(mpsc::error::TrySendError::Closed(_))));
    }
}

/// Injects the live-reload client script just before `</body>`, or
/// appends it if the tag is absent.
pub fn inject_reload_script(html: &str) -> String {
    if html.contains("/__reload") {
        return html.to_string();
    }
    match html.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + RELOAD_SCRIPT.len());
            out.push_str(&html[..idx]);
            out.push_str(RELOAD_SCRIPT);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{RELOAD_SCRIPT}"),
    }
}

pub async fn reload_handler(
    axum::extract::State(state): axum::extract::State<crate::state::SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribers.subscribe();
    let connected: Result<Event, Infallible> = Ok(Event::default().data("connected"));
    let connected = tokio_stream::once(connected);
    let reloads = ReceiverStream::new(rx).map(|_| Ok(Event::default().data("reload")));
    let stream = connected.chain(reloads);
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_before_closing_body_tag() {
        let html = "<html><body><p>hi</p></body></html>";
        let out = inject_reload_script(html);
        assert!(out.contains("EventSource"));
        assert!(out.find("EventSource").unwrap() < out.find("</body>").unwrap());
    }

    #[test]
    fn injection_is_idempotent() {
        let html = "<html><body><script>new EventSource(\"/__reload\")</script></body></html>";
        assert_eq!(inject_reload_script(html), html);
    }

    #[test]
    fn appends_when_no_body_tag() {
        let html = "<p>fragment</p>";
        let out = inject_reload_script(html);
        assert!(out.starts_with(html));
        assert!(out.contains("EventSource"));
    }

    #[tokio::test]
    async fn full_channel_drops_without_blocking() {
        let subs = Subscribers::new();
        let mut rx = subs.subscribe();
        subs.notify_all();
        subs.notify_all(); // second notify before the first is drained: dropped, not queued
        assert_eq!(rx.recv().await, Some(()));
        // no second item queued
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnected_subscriber_is_pruned() {
        let subs = Subscribers::new();
        let rx = subs.subscribe();
        drop(rx);
        subs.notify_all();
        assert_eq!(subs.senders.lock().unwrap().len(), 0);
    }
}
