mod common;

use std::time::{Duration, Instant};

use circuitvisor::{CircuitNode, CircuitSolver, EventKind, RuntimeError, SolveError, SolverConfig};
use common::{FAST, expect_event, is_kind, recorded_solver, slow};
use tokio::time::timeout;

fn wide_slow_circuit() -> CircuitNode {
    CircuitNode::and((0..32).map(|i| {
        CircuitNode::or([slow(i % 2 == 0), CircuitNode::not(slow(true))])
    }))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_mid_evaluation_cancels_pending_handle() {
    let (solver, mut events) = recorded_solver(SolverConfig::default());

    let value = solver.submit(wide_slow_circuit());
    let id = value.circuit_id();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(solver.pending(), 1);

    solver.shutdown();
    assert!(!solver.is_accepting());
    assert_eq!(value.value().await, Err(SolveError::Cancelled));
    assert_eq!(solver.pending(), 0);

    let late = solver.submit(CircuitNode::leaf(true));
    assert!(late.is_ready());
    assert_eq!(late.value().await, Err(SolveError::EngineStopped));

    let requested = expect_event(&mut events, is_kind(EventKind::ShutdownRequested)).await;
    assert_eq!(requested.pending, Some(1));
    // The cancellation and the rejection may be published in either order.
    let (mut cancelled, mut rejected) = (false, false);
    while !(cancelled && rejected) {
        let ev = expect_event(&mut events, |ev| {
            matches!(ev.kind, EventKind::CircuitCancelled | EventKind::SubmitRejected)
        })
        .await;
        match ev.kind {
            EventKind::CircuitCancelled => {
                assert_eq!(ev.circuit, Some(id));
                cancelled = true;
            }
            _ => {
                assert_eq!(ev.circuit, Some(late.circuit_id()));
                rejected = true;
            }
        }
    }

    // Every node task honours cancellation at its wait point.
    timeout(FAST, solver.shutdown_and_wait()).await.unwrap().unwrap();
    assert_eq!(solver.running_tasks(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delivered_value_survives_shutdown() {
    let solver = CircuitSolver::new(SolverConfig::default());

    let done = solver.submit(CircuitNode::or([CircuitNode::leaf(false), CircuitNode::leaf(true)]));
    assert_eq!(done.value().await, Ok(true));

    let pending = solver.submit(slow(true));
    solver.shutdown();

    assert_eq!(done.value().await, Ok(true));
    assert_eq!(done.try_value(), Some(Ok(true)));
    assert_eq!(pending.value().await, Err(SolveError::Cancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_is_idempotent() {
    let (solver, mut events) = recorded_solver(SolverConfig::default());
    let value = solver.submit(slow(false));

    solver.shutdown();
    solver.shutdown();
    assert_eq!(value.value().await, Err(SolveError::Cancelled));
    timeout(FAST, solver.shutdown_and_wait()).await.unwrap().unwrap();

    let mut requests = 0;
    loop {
        let ev = expect_event(&mut events, |_| true).await;
        match ev.kind {
            EventKind::ShutdownRequested => requests += 1,
            EventKind::AllStoppedWithin => break,
            _ => {}
        }
    }
    assert_eq!(requests, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_submit_after_shutdown_fails_immediately() {
    let solver = CircuitSolver::new(SolverConfig::default());
    solver.shutdown();

    let value = solver.submit(CircuitNode::and([CircuitNode::leaf(true)]));
    assert_eq!(value.try_value(), Some(Err(SolveError::EngineStopped)));
    assert_eq!(value.blocking_value(), Err(SolveError::EngineStopped));
    assert_eq!(solver.pending(), 0);
    assert_eq!(solver.running_tasks(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_zero_grace_returns_after_sweep() {
    let solver = CircuitSolver::new(SolverConfig {
        grace: Duration::ZERO,
        ..SolverConfig::default()
    });
    let value = solver.submit(wide_slow_circuit());

    solver.shutdown_and_wait().await.unwrap();
    assert_eq!(value.value().await, Err(SolveError::Cancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dropping_the_solver_cancels_pending_handles() {
    let solver = CircuitSolver::new(SolverConfig::default());
    let value = solver.submit(slow(true));
    drop(solver);

    assert_eq!(timeout(FAST, value.value()).await.unwrap(), Err(SolveError::Cancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_submit_and_shutdown_never_strand_a_handle() {
    for _ in 0..20 {
        let solver = CircuitSolver::new(SolverConfig::default());

        let submitters: Vec<_> = (0..4)
            .map(|_| {
                let solver = solver.clone();
                tokio::spawn(async move {
                    (0..25)
                        .map(|_| solver.submit(slow(true)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        tokio::task::yield_now().await;
        solver.shutdown();

        for submitter in submitters {
            for value in submitter.await.unwrap() {
                let got = timeout(FAST, value.value()).await.unwrap();
                assert!(
                    matches!(got, Err(SolveError::Cancelled | SolveError::EngineStopped)),
                    "unexpected {got:?}"
                );
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_grace_exceeded_when_tasks_cannot_run() {
    // Node tasks live on a runtime nobody drives, so none of them can observe cancellation.
    let idle = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let solver = CircuitSolver::builder(SolverConfig {
        grace: Duration::from_millis(50),
        ..SolverConfig::default()
    })
    .with_runtime(idle.handle().clone())
    .build();

    let values: Vec<_> = (0..3).map(|_| solver.submit(wide_slow_circuit())).collect();
    assert_eq!(solver.running_tasks(), 3);

    match solver.shutdown_and_wait().await {
        Err(RuntimeError::GraceExceeded { grace, stuck }) => {
            assert_eq!(grace, Duration::from_millis(50));
            assert_eq!(stuck, 3);
        }
        other => panic!("expected GraceExceeded, got {other:?}"),
    }
    for value in values {
        assert_eq!(value.try_value(), Some(Err(SolveError::Cancelled)));
    }

    drop(solver);
    idle.shutdown_background();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_pending_submissions_stay_cheap() {
    let solver = CircuitSolver::new(SolverConfig::default());

    let started = Instant::now();
    let values: Vec<_> = (0..20_000).map(|_| solver.submit(slow(true))).collect();
    assert!(started.elapsed() < FAST, "submission took {:?}", started.elapsed());
    assert_eq!(solver.pending(), values.len());

    solver.shutdown();
    for value in values {
        assert_eq!(value.try_value(), Some(Err(SolveError::Cancelled)));
    }
}
