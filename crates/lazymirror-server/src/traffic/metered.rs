use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::body::Body;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use tokio::sync::oneshot;

use super::TrafficAccountant;

enum Phase {
    Streaming,
    /// Inner body finished; waiting for the accountant to persist.
    Settling(oneshot::Receiver<()>),
    Done,
}

/// Response body that counts data bytes as they are polled.
///
/// Frames pass through untouched. End-of-stream is held back until the
/// accountant has handled this response's byte count. A body dropped early
/// (client gone, HEAD request) records what was sent so far.
pub struct MeteredBody {
    inner: Body,
    accountant: TrafficAccountant,
    sent: u64,
    phase: Phase,
}

impl MeteredBody {
    pub fn new(inner: Body, accountant: TrafficAccountant) -> Self {
        Self {
            inner,
            accountant,
            sent: 0,
            phase: Phase::Streaming,
        }
    }
}

impl HttpBody for MeteredBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        loop {
            match &mut this.phase {
                Phase::Streaming => match ready!(Pin::new(&mut this.inner).poll_frame(cx)) {
                    Some(Ok(frame)) => {
                        if let Some(data) = frame.data_ref() {
                            this.sent += data.len() as u64;
                        }
                        return Poll::Ready(Some(Ok(frame)));
                    }
                    Some(Err(e)) => {
                        this.accountant.record_detached(this.sent);
                        this.phase = Phase::Done;
                        return Poll::Ready(Some(Err(e)));
                    }
                    None => {
                        this.phase = Phase::Settling(this.accountant.record(this.sent));
                    }
                },
                Phase::Settling(rx) => {
                    // Err only means the accountant is gone; the response still ends.
                    let _ = ready!(Pin::new(rx).poll(cx));
                    this.phase = Phase::Done;
                }
                Phase::Done => return Poll::Ready(None),
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    fn size_hint(&self) -> SizeHint {
        match self.phase {
            Phase::Streaming => self.inner.size_hint(),
            _ => SizeHint::with_exact(0),
        }
    }
}

impl Drop for MeteredBody {
    fn drop(&mut self) {
        if let Phase::Streaming = self.phase {
            self.accountant.record_detached(self.sent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn counts_every_chunk_and_waits_for_persist() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("count.txt");
        let (acc, _persist) = TrafficAccountant::spawn(&file).unwrap();

        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"")),
            Ok(Bytes::from_static(b"world")),
        ];
        let body = Body::new(MeteredBody::new(Body::from_stream(stream::iter(chunks)), acc.clone()));

        let collected = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&collected[..], b"hello world");
        // persisted before the body reported its end
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "11");
        assert_eq!(acc.snapshot().total_bytes_sent, 11);
    }

    #[tokio::test]
    async fn dropped_body_records_partial_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("count.txt");
        let (acc, persist) = TrafficAccountant::spawn(&file).unwrap();

        let mut body = MeteredBody::new(Body::from("abcdef"), acc.clone());
        let frame = std::future::poll_fn(|cx| Pin::new(&mut body).poll_frame(cx))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame.into_data().unwrap().len(), 6);
        drop(body);

        drop(acc);
        persist.finish().await;
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "6");
    }

    #[test]
    fn size_hint_is_forwarded() {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let _guard = rt.enter();
        let dir = tempfile::tempdir().unwrap();
        let (acc, _persist) = TrafficAccountant::spawn(dir.path().join("c.txt")).unwrap();

        let body = MeteredBody::new(Body::from("twelve bytes"), acc);
        assert_eq!(body.size_hint().exact(), Some(12));
        assert!(!body.is_end_stream());
    }
}
