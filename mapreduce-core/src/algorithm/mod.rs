//! Algorithm plugin contract.
//!
//! An algorithm defines the semantics of a job: how one input line is mapped
//! into key/value records, how the values collected for one key are reduced
//! into output lines, and optionally how the concatenated reducer output is
//! post-processed into the final result.
//!
//! Key components of this module include:
//! ## [`Algorithm`]
//! The three-function plugin interface. `map` and `reduce` are required,
//! `aggregate` is optional and reports "not defined" by default.
//!
//! ## [`AlgorithmKind`]
//! A registry of all algorithms available to a deployment. Services are
//! generic over an [`AlgorithmKind`] and resolve the algorithm named in each
//! request against it. Registries are declared as enums whose variants wrap a
//! single algorithm, and the
//! [`AlgorithmKind` derive macro](crate::algorithm_derive::AlgorithmKind)
//! wires up name resolution and dispatch.
//!
//! ## [`Emitter`]
//! The collector handed to `map`. Every emission becomes one serialized
//! [`MappedRecord`].
//!
//! # Example
//!
//! ```
//! use mapreduce::algorithm::{Algorithm, AlgorithmKind, Emitter};
//! use mapreduce::algorithm_derive::AlgorithmKind;
//! use anyhow::Result;
//!
//! #[derive(Debug, Default, Clone, Copy)]
//! struct LineLength;
//!
//! impl Algorithm for LineLength {
//!     fn map(&self, line: &str, emit: &mut Emitter) -> Result<()> {
//!         emit.emit(line.len(), 1);
//!         Ok(())
//!     }
//!
//!     fn reduce(&self, key: &str, values: Vec<String>) -> Result<Option<Vec<String>>> {
//!         Ok(Some(vec![format!("{key}\t{}", values.len())]))
//!     }
//! }
//!
//! #[derive(AlgorithmKind, Debug, Clone, Copy)]
//! enum MyAlgorithms {
//!     #[algorithm(name = "line-length")]
//!     LineLength(LineLength),
//! }
//!
//! # fn main() {
//! assert!(MyAlgorithms::resolve("line-length").is_some());
//! assert_eq!(MyAlgorithms::names(), &["line-length"]);
//! # }
//! ```
use std::{
    any::Any,
    fmt::{Debug, Display},
    panic::{catch_unwind, AssertUnwindSafe},
};

use anyhow::Result;

use crate::record::MappedRecord;

/// The map/reduce/aggregate function set implementing one algorithm.
///
/// Implementations must be stateless: the same value is shared across
/// concurrent requests and re-resolved for every request.
pub trait Algorithm: Send + Sync + 'static {
    /// Emit zero or more key/value pairs for one non-blank input line.
    fn map(&self, line: &str, emit: &mut Emitter) -> Result<()>;

    /// Reduce the values collected for one key into output lines.
    ///
    /// `Ok(None)` signals that the key produces no output.
    fn reduce(&self, key: &str, values: Vec<String>) -> Result<Option<Vec<String>>>;

    /// Post-process the concatenation of every reducer's output.
    ///
    /// Returns `None` when the algorithm does not define an aggregate step, in
    /// which case the concatenation is the final result.
    fn aggregate(&self, _lines: &[String]) -> Option<Result<Vec<String>>> {
        None
    }
}

/// A name-addressable registry of [`Algorithm`]s.
///
/// This will be automatically implemented by the
/// [`AlgorithmKind`](crate::algorithm_derive::AlgorithmKind) derive macro.
pub trait AlgorithmKind: Algorithm + Copy + Debug {
    /// Look up an algorithm by its registered name.
    fn resolve(name: &str) -> Option<Self>;

    /// All registered names, in declaration order.
    fn names() -> &'static [&'static str];

    /// The registered name of this algorithm.
    fn name(&self) -> &'static str;
}

/// Resolve `name` against the registry `K`.
pub fn resolve<K: AlgorithmKind>(name: &str) -> std::result::Result<K, PluginContractError> {
    K::resolve(name).ok_or_else(|| PluginContractError::UnknownAlgorithm {
        name: name.to_string(),
        registered: K::names().to_vec(),
    })
}

/// Local emit collector passed to [`Algorithm::map`].
#[derive(Debug, Default)]
pub struct Emitter {
    records: Vec<String>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one `key<TAB>value` record.
    pub fn emit(&mut self, key: impl Display, value: impl Display) {
        self.records
            .push(MappedRecord::new(key.to_string(), value.to_string()).encode());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the collector, yielding the serialized records in emission
    /// order.
    pub fn into_records(self) -> Vec<String> {
        self.records
    }
}

/// Run plugin code on the blocking pool, converting panics into
/// [`ExecutionError::Panicked`].
pub async fn execute_blocking<T, F>(f: F) -> std::result::Result<T, ExecutionError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        catch_unwind(AssertUnwindSafe(f))
            .map_err(|panic| ExecutionError::Panicked(panic_message(panic.as_ref())))?
            .map_err(ExecutionError::Failed)
    })
    .await
    .map_err(|err| ExecutionError::Panicked(err.to_string()))?
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

mod error;
pub use error::*;

#[cfg(test)]
mod test {
    use anyhow::bail;

    use super::*;
    use crate::algorithm_derive::AlgorithmKind;

    #[derive(Debug, Default, Clone, Copy)]
    struct Echo;

    impl Algorithm for Echo {
        fn map(&self, line: &str, emit: &mut Emitter) -> Result<()> {
            emit.emit(line, "");
            Ok(())
        }

        fn reduce(&self, key: &str, _values: Vec<String>) -> Result<Option<Vec<String>>> {
            Ok(Some(vec![key.to_string()]))
        }
    }

    #[derive(Debug, Default, Clone, Copy)]
    struct Upper;

    impl Algorithm for Upper {
        fn map(&self, line: &str, emit: &mut Emitter) -> Result<()> {
            if line == "boom" {
                bail!("cannot map {line}");
            }
            emit.emit(line.to_uppercase(), 1);
            Ok(())
        }

        fn reduce(&self, _key: &str, _values: Vec<String>) -> Result<Option<Vec<String>>> {
            Ok(None)
        }

        fn aggregate(&self, lines: &[String]) -> Option<Result<Vec<String>>> {
            Some(Ok(lines.iter().rev().cloned().collect()))
        }
    }

    #[derive(AlgorithmKind, Debug, Clone, Copy)]
    #[mapreduce(internal)]
    enum TestAlgorithms {
        Echo(Echo),
        #[algorithm(name = "upper-case")]
        Upper(Upper),
    }

    #[test]
    fn it_resolves_registered_names() {
        assert!(matches!(
            TestAlgorithms::resolve("echo"),
            Some(TestAlgorithms::Echo(_))
        ));
        assert!(matches!(
            TestAlgorithms::resolve("upper-case"),
            Some(TestAlgorithms::Upper(_))
        ));
        assert_eq!(TestAlgorithms::names(), &["echo", "upper-case"]);
        assert_eq!(TestAlgorithms::resolve("upper-case").unwrap().name(), "upper-case");
    }

    #[test]
    fn it_rejects_unknown_names() {
        let err = resolve::<TestAlgorithms>("Upper").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown algorithm `Upper` (registered: echo, upper-case)"
        );
    }

    #[test]
    fn it_dispatches_to_the_wrapped_algorithm() {
        let algorithm = resolve::<TestAlgorithms>("upper-case").unwrap();
        let mut emit = Emitter::new();
        algorithm.map("abc", &mut emit).unwrap();
        assert_eq!(emit.into_records(), vec!["ABC\t1".to_string()]);
        assert!(algorithm.map("boom", &mut Emitter::new()).is_err());

        let lines = vec!["a".to_string(), "b".to_string()];
        let aggregated = algorithm.aggregate(&lines).unwrap().unwrap();
        assert_eq!(aggregated, vec!["b".to_string(), "a".to_string()]);

        let echo = resolve::<TestAlgorithms>("echo").unwrap();
        assert!(echo.aggregate(&lines).is_none());
    }

    #[tokio::test]
    async fn it_converts_panics_into_errors() {
        let result = execute_blocking(|| -> Result<()> { panic!("kaboom") }).await;
        assert!(matches!(result, Err(ExecutionError::Panicked(message)) if message == "kaboom"));

        let result = execute_blocking(|| Ok(7)).await;
        assert_eq!(result.unwrap(), 7);
    }
}
