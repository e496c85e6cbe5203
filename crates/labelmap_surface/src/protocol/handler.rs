//! Worker-side request handling.

use crate::codec::{deserialize_mesh, deserialize_volume, serialize_mesh};
use crate::error::Result;
use crate::isosurface::{IsoSurfaceConfig, IsoSurfaceExtractor, SurfaceNets};
use crate::pipeline::extract_surfaces_with;
use crate::types::SurfaceMap;

use super::message::{ExtractionRequest, ExtractionResponse};

/// Service one request: deserialize the volume, run the pipeline and
/// serialize every mesh, keyed by label.
pub fn handle_request(request: ExtractionRequest) -> Result<ExtractionResponse> {
  handle_request_with(&SurfaceNets, request)
}

/// [`handle_request`] with an explicit extractor.
#[tracing::instrument(skip_all, name = "protocol::handle_request")]
pub fn handle_request_with<E: IsoSurfaceExtractor + ?Sized>(
  extractor: &E,
  request: ExtractionRequest,
) -> Result<ExtractionResponse> {
  let ExtractionRequest { volume, options } = request;
  let volume = deserialize_volume(volume)?;

  tracing::debug!(
    dimensions = ?volume.dimensions(),
    segments = options.segments.as_ref().map(Vec::len),
    "handling extraction request"
  );

  let surfaces = extract_surfaces_with(
    extractor,
    &volume,
    options.segments.as_deref(),
    &IsoSurfaceConfig::default(),
  )?;

  let result = surfaces
    .into_iter()
    .map(|(label, mesh)| (label, serialize_mesh(mesh)))
    .collect();

  Ok(ExtractionResponse { result })
}

/// Caller-side decoding of a response, preserving label keys.
pub fn receive_response(response: ExtractionResponse) -> Result<SurfaceMap> {
  response
    .result
    .into_iter()
    .map(|(label, mesh)| Ok((label, deserialize_mesh(mesh)?)))
    .collect()
}
