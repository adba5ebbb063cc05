// self
use crate::{_prelude::*, obs::FlowKind};

/// Future returned by [`FlowSpan::instrument`]; instrumented only with the `tracing` feature.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; instrumented only with the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span covering one stage of a strategy flow.
///
/// Without the `tracing` feature the span only remembers its labels and every method is a
/// passthrough.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	kind: FlowKind,
	stage: &'static str,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span labeled with `kind` and `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		Self {
			kind,
			stage,
			#[cfg(feature = "tracing")]
			span: tracing::info_span!("oauth2_yahoo.flow", flow = kind.as_str(), stage),
		}
	}

	/// Flow this span belongs to.
	pub fn kind(&self) -> FlowKind {
		self.kind
	}

	/// Call site label.
	pub fn stage(&self) -> &'static str {
		self.stage
	}

	/// Runs a synchronous section inside the span.
	pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(f)
		}
		#[cfg(not(feature = "tracing"))]
		{
			f()
		}
	}

	/// Attaches the span to `fut` so no guard is held across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Emits a `debug` event on success or a `warn` event carrying the error on failure.
	///
	/// Errors are rendered with [`Display`]; none of the crate's errors embed token material.
	pub fn record<T, E>(&self, result: &Result<T, E>)
	where
		E: Display,
	{
		#[cfg(feature = "tracing")]
		match result {
			Ok(_) => tracing::debug!(parent: &self.span, "Flow stage completed."),
			Err(e) => tracing::warn!(parent: &self.span, error = %e, "Flow stage failed."),
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = result;
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn span_keeps_labels() {
		let span = FlowSpan::new(FlowKind::CodeExchange, "exchange_code");

		assert_eq!(span.kind(), FlowKind::CodeExchange);
		assert_eq!(span.stage(), "exchange_code");
		assert_eq!(span.in_scope(|| "inside"), "inside");

		span.record(&Err::<(), _>("boom"));
	}

	#[tokio::test]
	async fn instrument_passes_output_through() {
		let span = FlowSpan::new(FlowKind::ProfileResolution, "guid");
		let guid = span.instrument(async { "G1" }).await;

		assert_eq!(guid, "G1");
	}
}
