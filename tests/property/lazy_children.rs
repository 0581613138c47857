//! Property-based tests for lazy child materialization

use georef::context::Context;
use georef::engine::mock::{MockEngine, MockObject};
use georef::error::GeorefError;
use georef::factory::{ObjectKind, ProjObject};
use georef::types::RawHandle;
use std::rc::Rc;

/// For any pipeline length and any access sequence, `step(i)` returns the
/// same instance every time, out-of-range accesses fail with an index
/// error, and the step count is fetched from the engine exactly once.
#[test]
fn test_step_identity_stable_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(0usize..6, proptest::collection::vec(0usize..8, 0..20)),
            |(step_count, accesses)| {
                let engine = MockEngine::new();
                let steps: Vec<u64> = (0..step_count)
                    .map(|_| engine.insert(MockObject::of_kind(ObjectKind::Conversion)))
                    .collect();
                let pipeline_id = engine.insert(
                    MockObject::of_kind(ObjectKind::ConcatenatedOperation)
                        .with_steps(steps.clone()),
                );
                let ctx = Context::new(engine.clone());
                let ProjObject::Pipeline(pipeline) =
                    ctx.materialize(RawHandle::new(pipeline_id)).unwrap()
                else {
                    panic!("expected pipeline");
                };

                for index in accesses {
                    match pipeline.step(index) {
                        Ok(first) => {
                            assert!(index < step_count);
                            let again = pipeline.step(index).unwrap();
                            assert!(Rc::ptr_eq(&first, &again));
                            // One materialization per slot, ever.
                            assert_eq!(engine.minted_from(steps[index]).len(), 1);
                        }
                        Err(GeorefError::IndexOutOfRange { index: i, count }) => {
                            assert_eq!(i, index);
                            assert_eq!(count, step_count);
                            assert!(index >= step_count);
                        }
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }

                assert_eq!(pipeline.step_count().unwrap(), step_count);
                assert_eq!(engine.step_count_queries(pipeline_id), 1);
                Ok(())
            },
        )
        .unwrap();
}

/// Forcing enumeration materializes every slot exactly once, even after a
/// partial access pattern; disposal then releases each child exactly once.
#[test]
fn test_enumeration_forces_each_slot_once_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(1usize..6, proptest::collection::vec(0usize..6, 0..6)), |(step_count, warmup)| {
            let engine = MockEngine::new();
            let steps: Vec<u64> = (0..step_count)
                .map(|_| engine.insert(MockObject::of_kind(ObjectKind::Transformation)))
                .collect();
            let pipeline_id = engine.insert(
                MockObject::of_kind(ObjectKind::ConcatenatedOperation).with_steps(steps.clone()),
            );
            let ctx = Context::new(engine.clone());
            let ProjObject::Pipeline(pipeline) =
                ctx.materialize(RawHandle::new(pipeline_id)).unwrap()
            else {
                panic!("expected pipeline");
            };

            for index in warmup {
                let _ = pipeline.step(index % step_count);
            }
            let all = pipeline.steps().unwrap();
            assert_eq!(all.len(), step_count);
            for template in &steps {
                assert_eq!(engine.minted_from(*template).len(), 1);
            }

            pipeline.dispose();
            for template in &steps {
                assert_eq!(engine.destroy_count(engine.minted_from(*template)[0]), 1);
            }
            assert_eq!(engine.destroy_count(pipeline_id), 1);
            Ok(())
        })
        .unwrap();
}
