//! Full-trace runner: builds the configured engines and drives each one,
//! independently, over the shared memory-mapped trace.
//!
//! One OS thread per engine (`std::thread::scope`), no shared mutable
//! state: every thread only reads the trace's `accesses()` iterator and
//! owns its engine exclusively. Failures on one engine never affect
//! another; the runner collects every `Result` and the caller decides the
//! process exit code from whether any of them failed.

use std::path::Path;

use mrc_core::mrc::MissRateCurve;
use tracing::{error, info, info_span};

use crate::config::EngineSpec;
use crate::error::Result;
use crate::io;
use crate::trace::{Format, Trace};

/// Outcome of running a single engine to completion.
pub struct EngineOutcome {
    pub algorithm: String,
    pub result: Result<()>,
}

/// Runs every `spec` in `specs` against the trace at `trace_path`, one OS
/// thread per engine, and writes each engine's histogram and MRC to the
/// paths named in its [`EngineSpec`].
///
/// Returns one [`EngineOutcome`] per spec, in the same order. This never
/// returns `Err` itself; per-engine failures are reported in the
/// individual outcomes, so an error on one engine never affects another.
pub fn run(trace_path: &Path, format: Format, specs: &[EngineSpec]) -> Result<Vec<EngineOutcome>> {
    let trace = Trace::open(trace_path, format)?;
    info!(
        records = trace.len(),
        engines = specs.len(),
        path = %trace_path.display(),
        "starting trace run"
    );

    let outcomes = std::thread::scope(|scope| {
        let handles: Vec<_> = specs
            .iter()
            .map(|spec| {
                let trace = &trace;
                scope.spawn(move || run_one(trace, spec))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("engine thread panicked"))
            .collect::<Vec<_>>()
    });

    Ok(outcomes)
}

fn run_one(trace: &Trace, spec: &EngineSpec) -> EngineOutcome {
    let span = info_span!("engine", algorithm = %spec.algorithm);
    let _guard = span.enter();

    let result = (|| -> Result<()> {
        let mut engine = spec.build()?;
        for key in trace.accesses() {
            engine.access(key);
        }
        engine.post_process();
        engine
            .histogram()
            .validate()
            .map_err(|source| crate::error::RunnerError::Engine {
                algorithm: spec.algorithm.clone(),
                source,
            })?;

        io::write_histogram(&spec.hist_path, engine.histogram())?;
        let curve = MissRateCurve::from_histogram(engine.histogram());
        io::write_mrc(&spec.mrc_path, &curve)?;
        Ok(())
    })();

    match &result {
        Ok(()) => info!(algorithm = %spec.algorithm, "engine finished"),
        Err(e) => error!(algorithm = %spec.algorithm, error = %e, "engine failed"),
    }

    EngineOutcome {
        algorithm: spec.algorithm.clone(),
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{TraceGenerator, TraceGeneratorConfig};

    #[test]
    fn runs_multiple_engines_independently() {
        let dir = tempfile::tempdir().unwrap();
        let trace_path = dir.path().join("trace.bin");
        TraceGenerator::new(TraceGeneratorConfig {
            length: 2000,
            num_keys: 64,
            output_path: trace_path.clone(),
            format: Format::TimestampSEviction,
            ..Default::default()
        })
        .generate()
        .unwrap();

        let specs = vec![
            EngineSpec::parse(
                "olken",
                dir.path().join("olken.hist"),
                dir.path().join("olken.mrc"),
            )
            .unwrap(),
            EngineSpec::parse(
                "evicting_map(size=32)",
                dir.path().join("em.hist"),
                dir.path().join("em.mrc"),
            )
            .unwrap(),
        ];

        let outcomes = run(&trace_path, Format::TimestampSEviction, &specs).unwrap();
        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            assert!(outcome.result.is_ok(), "{} failed", outcome.algorithm);
        }
        assert!(dir.path().join("olken.hist").exists());
        assert!(dir.path().join("olken.mrc").exists());
    }

    #[test]
    fn unknown_algorithm_fails_only_that_engine() {
        let dir = tempfile::tempdir().unwrap();
        let trace_path = dir.path().join("trace.bin");
        TraceGenerator::new(TraceGeneratorConfig {
            length: 100,
            num_keys: 16,
            output_path: trace_path.clone(),
            format: Format::TimestampSEviction,
            ..Default::default()
        })
        .generate()
        .unwrap();

        let specs = vec![
            EngineSpec::parse(
                "olken",
                dir.path().join("olken.hist"),
                dir.path().join("olken.mrc"),
            )
            .unwrap(),
            EngineSpec::parse(
                "not_real",
                dir.path().join("bad.hist"),
                dir.path().join("bad.mrc"),
            )
            .unwrap(),
        ];

        let outcomes = run(&trace_path, Format::TimestampSEviction, &specs).unwrap();
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_err());
    }
}
