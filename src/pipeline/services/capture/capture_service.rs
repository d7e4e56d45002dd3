use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::Future;
use futures::task::{Context, Poll};
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower::util::BoxService;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt};

use super::source::CaptureSource;
use crate::common::Frame;
use crate::error::CaptureError;

/// Adapts a [`CaptureSource`] to a tower service so it can be layered.
#[derive(Clone)]
pub struct CaptureService {
    inner: Arc<dyn CaptureSource>,
}

impl CaptureService {
    pub fn new(inner: Box<dyn CaptureSource>) -> Self {
        Self {
            inner: Arc::from(inner),
        }
    }
}

impl Service<()> for CaptureService {
    type Response = Frame;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: ()) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let bytes = inner.capture().await?;
            Ok(Frame::new(bytes, inner.name()))
        })
    }
}

/// Capture step with an optional deadline.
pub struct Capturer {
    service: BoxService<(), Frame, BoxError>,
    timeout: Option<Duration>,
}

impl Capturer {
    pub fn new(source: Box<dyn CaptureSource>, timeout: Option<Duration>) -> Self {
        let service = ServiceBuilder::new()
            .option_layer(timeout.map(TimeoutLayer::new))
            .service(CaptureService::new(source));

        Self {
            service: BoxService::new(service),
            timeout,
        }
    }

    pub async fn capture(&mut self) -> Result<Frame, CaptureError> {
        let timeout = self.timeout;
        let service = self.service.ready().await.map_err(|e| into_capture_error(e, timeout))?;
        service.call(()).await.map_err(|e| into_capture_error(e, timeout))
    }
}

fn into_capture_error(err: BoxError, timeout: Option<Duration>) -> CaptureError {
    if err.is::<Elapsed>() {
        return CaptureError::Timeout(timeout.unwrap_or_default());
    }
    match err.downcast::<CaptureError>() {
        Ok(err) => *err,
        Err(err) => CaptureError::Service(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(&'static [u8]);

    #[async_trait]
    impl CaptureSource for Fixed {
        async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
            Ok(self.0.to_vec())
        }

        fn name(&self) -> &'static str {
            "Fixed"
        }
    }

    struct Slow;

    #[async_trait]
    impl CaptureSource for Slow {
        async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![1])
        }

        fn name(&self) -> &'static str {
            "Slow"
        }
    }

    struct Broken;

    #[async_trait]
    impl CaptureSource for Broken {
        async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
            Err(CaptureError::Empty)
        }

        fn name(&self) -> &'static str {
            "Broken"
        }
    }

    #[tokio::test]
    async fn test_capture_service() {
        let mut service = CaptureService::new(Box::new(Fixed(b"abc")));
        let frame = service.call(()).await.unwrap();
        assert_eq!(frame.bytes(), b"abc");
        assert_eq!(frame.source(), "Fixed");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_capture_times_out() {
        let mut capturer = Capturer::new(Box::new(Slow), Some(Duration::from_secs(5)));
        let err = capturer.capture().await.unwrap_err();
        assert!(matches!(err, CaptureError::Timeout(d) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn source_errors_keep_their_kind() {
        let mut capturer = Capturer::new(Box::new(Broken), Some(Duration::from_secs(5)));
        assert!(matches!(capturer.capture().await, Err(CaptureError::Empty)));

        let mut capturer = Capturer::new(Box::new(Broken), None);
        assert!(matches!(capturer.capture().await, Err(CaptureError::Empty)));
    }
}
