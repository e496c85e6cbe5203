use std::sync::Mutex;
use std::time::Duration;

use super::*;
use crate::codec::SerializedVolume;
use crate::pipeline::test_utils::*;
use crate::protocol::TransferKind;

fn request() -> ExtractionRequest {
  ExtractionRequest::new(SerializedVolume::from(two_label_volume()), None)
}

fn poll_until_done(pending: &mut PendingExtraction) -> Result<SurfaceMap> {
  for _ in 0..10_000 {
    if let Some(result) = pending.poll() {
      return result;
    }
    std::thread::sleep(Duration::from_millis(1));
  }
  panic!("extraction did not finish");
}

#[test]
fn test_poll_delivers_once() {
  let mut pending = ExtractionExecutor::global().submit(request());
  assert!(pending.is_pending());

  let surfaces = poll_until_done(&mut pending).unwrap();
  assert_eq!(surfaces.len(), 2);

  assert!(!pending.is_pending());
  assert!(pending.poll().is_none());
}

#[test]
fn test_wait_blocks_for_reply() {
  let surfaces = ExtractionExecutor::global().submit(request()).wait().unwrap();
  assert_eq!(surfaces.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn test_panic_is_transport_failure() {
  let executor = ExtractionExecutor::global();
  let err = executor
    .submit_with(Arc::new(PanickingExtractor), request())
    .wait()
    .unwrap_err();

  match err {
    SurfaceError::TransportFailure { reason } => assert!(reason.contains("extractor panicked")),
    other => panic!("unexpected error: {other:?}"),
  }
}

#[test]
fn test_vanished_worker_is_transport_failure() {
  let (sender, receiver) = channel::bounded::<Reply>(1);
  drop(sender);

  let err = PendingExtraction::new(RequestId::next(), receiver).wait().unwrap_err();
  assert!(matches!(err, SurfaceError::TransportFailure { .. }));
}

#[test]
fn test_vanished_worker_on_poll() {
  let (sender, receiver) = channel::bounded::<Reply>(1);
  drop(sender);

  let mut pending = PendingExtraction::new(RequestId::next(), receiver);
  assert!(matches!(
    pending.poll(),
    Some(Err(SurfaceError::TransportFailure { .. }))
  ));
  assert!(pending.poll().is_none());
}

#[test]
fn test_terminate_discards_reply() {
  let executor = ExtractionExecutor::global();
  let pending = executor.submit(request());
  let id = pending.id();
  pending.terminate();

  // Later requests are unaffected
  let next = executor.submit(request());
  assert_ne!(next.id(), id);
  assert_eq!(next.wait().unwrap().len(), 2);
}

#[test]
fn test_buffers_move_without_copy() {
  let request = request();
  let sent: Vec<_> = request.transferables();
  let seen_by_worker = Arc::new(Mutex::new(None));
  let replied = Arc::new(Mutex::new(Vec::new()));

  let pending = {
    let seen_by_worker = Arc::clone(&seen_by_worker);
    let replied = Arc::clone(&replied);
    ExtractionExecutor::global().dispatch(request, move |request| {
      *seen_by_worker.lock().unwrap() = Some(request.transferables());
      let response = handle_request(request)?;
      *replied.lock().unwrap() = response.transferables();
      Ok(response)
    })
  };

  let surfaces = pending.wait().unwrap();

  // Request buffers arrive at the worker in place
  assert_eq!(seen_by_worker.lock().unwrap().as_ref(), Some(&sent));

  // Response buffers arrive at the caller in place
  let replied = replied.lock().unwrap();
  assert!(!replied.is_empty());
  for t in replied.iter() {
    let label = t.label.unwrap();
    let mesh = &surfaces[&label];
    let addr = match t.kind {
      TransferKind::Points => mesh.points.as_ptr() as usize,
      TransferKind::Polys => mesh.polys.as_ptr() as usize,
      TransferKind::Normals => mesh.normals.as_ref().unwrap().as_ptr() as usize,
      other => panic!("unexpected transferable {other:?}"),
    };
    assert_eq!(addr, t.addr);
  }
}

#[test]
fn test_dedicated_pool() {
  let executor = ExtractionExecutor::new(
    ExecutorConfig::new()
      .with_num_threads(2)
      .with_thread_name_prefix("labelmap-test"),
  )
  .unwrap();
  assert_eq!(executor.num_threads(), 2);

  let name = Arc::new(Mutex::new(None));
  let pending = {
    let name = Arc::clone(&name);
    executor.dispatch(request(), move |request| {
      *name.lock().unwrap() = std::thread::current().name().map(str::to_string);
      handle_request(request)
    })
  };

  assert_eq!(pending.wait().unwrap().len(), 2);
  let name = name.lock().unwrap().clone().unwrap();
  assert!(name.starts_with("labelmap-test-"));
}

#[test]
fn test_concurrent_requests_are_independent() {
  let executor = ExtractionExecutor::global();
  let pending: Vec<_> = (1..=4)
    .map(|count| {
      executor.submit(ExtractionRequest::new(
        SerializedVolume::from(slab_volume(2, count)),
        None,
      ))
    })
    .collect();

  for (count, pending) in (1..=4).zip(pending) {
    assert_eq!(pending.wait().unwrap().len(), count as usize);
  }
}

#[test]
fn test_executor_config_defaults() {
  let config = ExecutorConfig::default();
  assert_eq!(config.num_threads, None);
  assert_eq!(config.thread_name_prefix, None);
}
