#![cfg(unix)]

mod common;

use std::process::Command;
use std::time::Duration;

use circuitvisor::{CircuitSolver, SolveError, SolverConfig};
use common::{FAST, slow};
use tokio::signal::unix::{SignalKind, signal};
use tokio::time::timeout;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sigterm_shuts_the_solver_down() {
    // Holding our own SIGTERM stream keeps the default action from killing the test process.
    let mut sigterm = signal(SignalKind::terminate()).unwrap();

    let solver = CircuitSolver::new(SolverConfig::default());
    solver.shutdown_on_signal();
    let value = solver.submit(slow(true));

    let pid = std::process::id().to_string();
    timeout(FAST, async {
        // The listener may not be registered yet; repeat until it reacts.
        while solver.is_accepting() {
            let status = Command::new("kill").args(["-TERM", &pid]).status().unwrap();
            assert!(status.success());
            let _ = timeout(Duration::from_millis(50), sigterm.recv()).await;
        }
    })
    .await
    .expect("solver should stop accepting after SIGTERM");

    assert_eq!(value.value().await, Err(SolveError::Cancelled));
}
