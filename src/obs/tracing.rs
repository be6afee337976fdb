// self
use crate::{
	_prelude::*,
	http::{HeaderMap, HttpRequest, HttpResponse},
	obs::FlowKind,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by engine operations.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth_relay.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits the fully signed request as a debug event.
pub fn dump_request(request: &HttpRequest) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		method = %request.method(),
		uri = %request.uri(),
		headers = %render_headers(request.headers()),
		body = %String::from_utf8_lossy(request.body()),
		"signed request"
	);

	#[cfg(not(feature = "tracing"))]
	let _ = request;
}

/// Emits the raw provider response as a debug event.
pub fn dump_response(response: &HttpResponse) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		status = response.status().as_u16(),
		headers = %render_headers(response.headers()),
		body = %String::from_utf8_lossy(response.body()),
		"provider response"
	);

	#[cfg(not(feature = "tracing"))]
	let _ = response;
}

/// Renders headers as `name: value` lines in wire order.
pub fn render_headers(headers: &HeaderMap) -> String {
	headers
		.iter()
		.map(|(name, value)| format!("{name}: {}", String::from_utf8_lossy(value.as_bytes())))
		.collect::<Vec<_>>()
		.join("\n")
}
