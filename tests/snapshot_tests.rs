//! Snapshot service dispatch tests over a fake capture session.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use camshot::camera::{CameraError, CameraInfo, Frame};
use camshot::session::{CaptureSession, ImageFormat, RequestId, SessionEvent};
use camshot::snapshot::{SnapshotError, SnapshotService};

#[derive(Default)]
struct SessionLog {
    bound: bool,
    active: bool,
    reject_captures: bool,
    capture_calls: Vec<(PathBuf, ImageFormat)>,
}

#[derive(Clone, Default)]
struct FakeSession {
    log: Rc<RefCell<SessionLog>>,
}

impl FakeSession {
    fn running() -> Self {
        let session = Self::default();
        {
            let mut log = session.log.borrow_mut();
            log.bound = true;
            log.active = true;
        }
        session
    }

    fn rejecting() -> Self {
        let session = Self::running();
        session.log.borrow_mut().reject_captures = true;
        session
    }

    fn capture_calls(&self) -> Vec<(PathBuf, ImageFormat)> {
        self.log.borrow().capture_calls.clone()
    }
}

impl CaptureSession for FakeSession {
    fn bind(&mut self, _device: &CameraInfo) -> Result<(), CameraError> {
        self.log.borrow_mut().bound = true;
        Ok(())
    }

    fn unbind(&mut self) {
        let mut log = self.log.borrow_mut();
        log.bound = false;
        log.active = false;
    }

    fn start(&mut self) -> Result<(), CameraError> {
        self.log.borrow_mut().active = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.log.borrow_mut().active = false;
    }

    fn is_bound(&self) -> bool {
        self.log.borrow().bound
    }

    fn is_active(&self) -> bool {
        self.log.borrow().active
    }

    fn latest_frame(&self) -> Option<Frame> {
        None
    }

    fn capture_to_file(&mut self, path: &Path, format: ImageFormat) -> RequestId {
        let mut log = self.log.borrow_mut();
        if log.reject_captures {
            return RequestId::INVALID;
        }
        log.capture_calls.push((path.to_path_buf(), format));
        RequestId(log.capture_calls.len() as i64)
    }

    fn poll_events(&mut self) -> Vec<SessionEvent> {
        Vec::new()
    }
}

#[test]
fn capture_while_unbound_reports_not_running_and_issues_nothing() {
    let mut session = FakeSession::default();
    let service = SnapshotService::new(None);

    let result = service.capture(&mut session, None, ImageFormat::Jpeg);

    assert!(matches!(result, Err(SnapshotError::NotRunning)));
    assert!(session.capture_calls().is_empty());
}

#[test]
fn capture_while_stopped_reports_not_running_and_issues_nothing() {
    let mut session = FakeSession::default();
    session.log.borrow_mut().bound = true; // bound but preview inactive
    let service = SnapshotService::new(None);

    let result = service.capture(&mut session, None, ImageFormat::Png);

    assert!(matches!(result, Err(SnapshotError::NotRunning)));
    assert!(session.capture_calls().is_empty());
}

#[test]
fn capture_generates_default_path_in_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = FakeSession::running();
    let service = SnapshotService::new(Some(dir.path().to_path_buf()));

    let (id, path) = service
        .capture(&mut session, None, ImageFormat::Jpeg)
        .unwrap();

    assert!(id.is_valid());
    assert!(path.starts_with(dir.path().join("camshot")));
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("shot_"));
    assert!(name.ends_with(".jpg"));
    // The destination folder is created on dispatch
    assert!(dir.path().join("camshot").is_dir());

    let calls = session.capture_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, ImageFormat::Jpeg);
}

#[test]
fn requested_png_format_flows_into_extension() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = FakeSession::running();
    let service = SnapshotService::new(Some(dir.path().to_path_buf()));

    let (_id, path) = service
        .capture(&mut session, None, ImageFormat::Png)
        .unwrap();

    assert_eq!(path.extension().unwrap(), "png");
    assert_eq!(session.capture_calls()[0].1, ImageFormat::Png);
}

#[test]
fn explicit_path_wins_and_format_follows_its_extension() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = FakeSession::running();
    let service = SnapshotService::new(None);
    let explicit = dir.path().join("picked.PNG");

    let (_id, path) = service
        .capture(&mut session, Some(explicit.clone()), ImageFormat::Jpeg)
        .unwrap();

    // The destination extension overrides the requested format
    assert_eq!(path, explicit);
    assert_eq!(session.capture_calls()[0].1, ImageFormat::Png);
}

#[test]
fn explicit_bare_filename_dispatches_without_directory_creation() {
    let mut session = FakeSession::running();
    let service = SnapshotService::new(None);

    // A bare relative destination has no directory component to create
    let (id, path) = service
        .capture(&mut session, Some(PathBuf::from("shot.jpg")), ImageFormat::Png)
        .unwrap();

    assert!(id.is_valid());
    assert_eq!(path, PathBuf::from("shot.jpg"));
    assert_eq!(session.capture_calls()[0].1, ImageFormat::Jpeg);
}

#[test]
fn session_rejection_reports_capture_start_failed() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = FakeSession::rejecting();
    let service = SnapshotService::new(Some(dir.path().to_path_buf()));

    let result = service.capture(&mut session, None, ImageFormat::Jpeg);

    assert!(matches!(result, Err(SnapshotError::CaptureStartFailed)));
    assert!(session.capture_calls().is_empty());
    // A rejected request produces no later saved/error event
    assert!(session.poll_events().is_empty());
}
