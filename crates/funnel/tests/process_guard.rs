//! Process guard tests
//!
//! The hook is process-wide, so everything runs in a single test.

use std::sync::{Arc, Mutex};
use std::thread;

use funnel::{ErrorValue, Funnel, FunnelError, Listener, ProcessGuard};

#[test]
fn test_process_guard() {
    let funnel = Funnel::new();
    let seen: Arc<Mutex<Vec<ErrorValue>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let listener: Listener = Arc::new(move |value: &ErrorValue| {
        sink.lock().unwrap().push(value.clone());
    });
    funnel.on("error", listener);

    assert!(!ProcessGuard::is_installed());
    ProcessGuard::install(&funnel).unwrap();
    assert!(ProcessGuard::is_installed());
    assert!(matches!(
        ProcessGuard::install(&funnel),
        Err(FunnelError::GuardInstalled)
    ));

    // uncaught panic on another thread is raised once
    let worker = thread::spawn(|| panic!("worker crashed"));
    assert!(worker.join().is_err());

    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let report = seen[0].report().unwrap();
        assert_eq!(report.message, "worker crashed");
        assert_eq!(report.kind.as_deref(), Some("panic"));
        assert!(report.location.as_deref().unwrap().contains("process_guard.rs"));
    }

    // panics captured by the funnel are not reported twice
    let guarded = funnel.wrap(|_, n: u32| -> Result<u32, String> {
        if n == 0 {
            panic!("zero");
        }
        Ok(n)
    });
    assert_eq!(guarded.exec(0), None);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    let report = seen[1].report().unwrap();
    assert_eq!(report.message, "zero");
    assert!(report.location.as_deref().unwrap().contains("process_guard.rs"));
}
