use converge::error::{estimate_L2_error, estimate_max_error, DEFAULT_DEGREE_RAISE};
use converge::engine::FiniteElementEngine;
use converge::reduce::{BarrierComm, Communicator, Reduction, SerialComm};
use matrixcompare::assert_scalar_eq;
use std::f64::consts::PI;
use std::thread;
use util::UniformGrid1dEngine;

#[test]
fn serial_comm_is_the_identity() {
    let comm = SerialComm;
    assert_eq!(<SerialComm as Communicator<f64>>::num_partitions(&comm), 1);
    assert_eq!(comm.all_reduce(3.5, Reduction::Sum), 3.5);
    assert_eq!(comm.all_reduce(3.5, Reduction::Max), 3.5);
}

#[test]
fn barrier_comm_reduces_sums_and_maxima() {
    let comms = BarrierComm::<f64>::create(4);
    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                scope.spawn(move || {
                    let local = (comm.partition_index() + 1) as f64;
                    let sum = comm.all_reduce(local, Reduction::Sum);
                    // Handles must be reusable for successive reductions.
                    let max = comm.all_reduce(local, Reduction::Max);
                    (sum, max)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Every participant must observe the identical globally reduced values.
    for (sum, max) in results {
        assert_eq!(sum, 1.0 + 2.0 + 3.0 + 4.0);
        assert_eq!(max, 4.0);
    }
}

#[test]
fn max_reduction_preserves_negative_contributions() {
    // Max over all-negative locals must return the largest local, not an artificial zero,
    // and must agree with the serial communicator.
    let mut comms = BarrierComm::<f64>::create(1);
    let comm = comms.pop().unwrap();
    assert_eq!(comm.all_reduce(-5.0, Reduction::Max), -5.0);
    assert_eq!(SerialComm.all_reduce(-5.0, Reduction::Max), -5.0);

    let locals = [-5.0, -2.0, -7.0];
    let comms = BarrierComm::<f64>::create(locals.len());
    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                scope.spawn(move || comm.all_reduce(locals[comm.partition_index()], Reduction::Max))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for max in results {
        assert_eq!(max, -2.0);
    }
}

#[test]
fn barrier_comm_with_a_single_participant_is_the_identity() {
    let mut comms = BarrierComm::<f64>::create(1);
    let comm = comms.pop().unwrap();
    assert_eq!(comm.all_reduce(2.25, Reduction::Sum), 2.25);
}

fn u_smooth(x: f64) -> f64 {
    (2.0 * PI * x).sin() * x.exp()
}

/// Splitting an error computation across partitions and reducing must agree with the
/// unpartitioned computation.
#[test]
#[allow(non_snake_case)]
fn partitioned_error_norms_match_the_serial_computation() {
    let resolution = 16;
    let degree = 2;

    let serial_engine = UniformGrid1dEngine::<f64>::new(u_smooth);
    let (u_h, u_exact) = serial_engine.solve(resolution, degree).unwrap();
    let serial_L2 =
        estimate_L2_error(&serial_engine, &u_h, &u_exact, DEFAULT_DEGREE_RAISE, &SerialComm).unwrap();
    let serial_max = estimate_max_error(&serial_engine, &u_h, &u_exact, &SerialComm).unwrap();

    let num_partitions = 3;
    let comms = BarrierComm::<f64>::create(num_partitions);
    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                scope.spawn(move || {
                    let engine = UniformGrid1dEngine::<f64>::new(u_smooth)
                        .with_partition(comm.partition_index(), num_partitions);
                    let (u_h, u_exact) = engine.solve(resolution, degree).unwrap();
                    let L2 =
                        estimate_L2_error(&engine, &u_h, &u_exact, DEFAULT_DEGREE_RAISE, &comm).unwrap();
                    let max = estimate_max_error(&engine, &u_h, &u_exact, &comm).unwrap();
                    (L2, max)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.len(), num_partitions);
    for (L2, max) in results {
        assert_scalar_eq!(L2, serial_L2, comp = abs, tol = 1e-12);
        assert_scalar_eq!(max, serial_max, comp = abs, tol = 1e-12);
    }
}
