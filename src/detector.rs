//! Detection service seam and the dry-run implementation.

use async_channel as channel;
use async_trait::async_trait;
use tracing::debug;

use crate::request::{timestamp_now, Request, Response};
use crate::scanner::CancelToken;

/// A detection backend: consumes requests until the request channel closes,
/// produces one response per request, then returns. Responses must echo the
/// identifying envelope of their request verbatim so the response processor
/// can locate tracker entries by ID.
#[async_trait]
pub trait Detector: Send + Sync {
	async fn run(
		&self,
		cancel: CancelToken,
		requests: channel::Receiver<Request>,
		responses: channel::Sender<Response>,
	);
}

/// Detector that echoes every request as a response with no results. Used for
/// offline runs and end-to-end tests, where the pipeline mechanics matter and
/// the detection backend does not.
#[derive(Debug, Default)]
pub struct DryRunDetector;

impl DryRunDetector {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Detector for DryRunDetector {
	async fn run(
		&self,
		cancel: CancelToken,
		requests: channel::Receiver<Request>,
		responses: channel::Sender<Response>,
	) {
		debug!("started dry-run detector");
		while let Ok(request) = requests.recv().await {
			if cancel.is_cancelled() {
				break;
			}
			let mut response = Response::from_request(&request);
			response.meta.time.stop = timestamp_now();
			if responses.send(response).await.is_err() {
				break;
			}
		}
		debug!("finished dry-run detector");
	}
}
