//! Asynchronous compilation of source files.
//!
//! Each file gets its own [`Frontend`], so independent files compile
//! concurrently: reads go through tokio's file system API and the
//! CPU-bound pipeline runs on the blocking thread pool.
//!
//! # Example
//!
//! ```ignore
//! use spacey_frontend::{AsyncFrontend, FrontendConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let frontend = AsyncFrontend::new(FrontendConfig::default());
//!     let unit = frontend.compile_file("script.js").await.unwrap();
//!     println!("{}", unit.ir.unwrap_or_default());
//! }
//! ```

use std::path::Path;
use tokio::fs;

use crate::{Error, Frontend, FrontendConfig, Result};

/// The outcome of compiling one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    /// Name the source was registered under
    pub name: String,
    /// Rendered IR module; `None` when only validating or on failure
    pub ir: Option<String>,
    /// Formatted diagnostics, in report order
    pub diagnostics: Vec<String>,
    /// The error that stopped the pipeline, if any
    pub error: Option<String>,
    /// Number of IR functions produced
    pub functions: usize,
}

impl CompiledUnit {
    /// Returns true if the source parsed, validated and lowered.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Compiles sources off the async runtime's worker threads.
#[derive(Debug, Clone, Default)]
pub struct AsyncFrontend {
    config: FrontendConfig,
    validate_only: bool,
    force_lazy: bool,
}

impl AsyncFrontend {
    /// Creates an async front end using `config` for every source.
    pub fn new(config: FrontendConfig) -> Self {
        Self {
            config,
            validate_only: false,
            force_lazy: false,
        }
    }

    /// Stops every compilation after validation.
    pub fn with_validate_only(mut self, validate_only: bool) -> Self {
        self.validate_only = validate_only;
        self
    }

    /// Lowers deferred bodies too, so the IR is complete.
    pub fn with_force_lazy(mut self, force_lazy: bool) -> Self {
        self.force_lazy = force_lazy;
        self
    }

    /// Compiles source text.
    pub async fn compile_source(&self, name: String, text: String) -> Result<CompiledUnit> {
        let config = self.config.clone();
        let options = (self.validate_only, self.force_lazy);
        let task = tokio::task::spawn_blocking(move || compile_unit(config, options, name, text));
        match task.await {
            Ok(unit) => Ok(unit),
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            Err(error) => Err(Error::Io(std::io::Error::other(error))),
        }
    }

    /// Reads and compiles a file.
    pub async fn compile_file(&self, path: impl AsRef<Path>) -> Result<CompiledUnit> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).await?;
        self.compile_source(path.display().to_string(), text).await
    }

    /// Compiles several files concurrently, returning results in the order
    /// of `paths`.
    pub async fn compile_files(&self, paths: &[impl AsRef<Path>]) -> Vec<Result<CompiledUnit>> {
        let futures: Vec<_> = paths.iter().map(|path| self.compile_file(path)).collect();

        futures::future::join_all(futures).await
    }
}

fn compile_unit(
    config: FrontendConfig,
    (validate_only, force_lazy): (bool, bool),
    name: String,
    text: String,
) -> CompiledUnit {
    let mut frontend = Frontend::new(config);
    let result = if validate_only {
        frontend.check(name.clone(), text).map(|_| ())
    } else {
        frontend.compile(name.clone(), text).and_then(|_| {
            if force_lazy {
                frontend.compile_all_lazy()?;
            }
            Ok(())
        })
    };

    let diagnostics = frontend
        .diagnostics()
        .iter()
        .map(|diagnostic| frontend.format_diagnostic(diagnostic))
        .collect();
    let (ir, error) = match &result {
        Ok(()) if validate_only => (None, None),
        Ok(()) => (Some(frontend.module_to_string()), None),
        Err(error) => (None, Some(frontend.format_error(error))),
    };

    CompiledUnit {
        name,
        ir,
        diagnostics,
        error,
        functions: frontend.module().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_compile_source() {
        let frontend = AsyncFrontend::new(FrontendConfig::default());
        let unit = frontend
            .compile_source("t.js".into(), "function f(a) { return a; }".into())
            .await
            .unwrap();
        assert!(unit.is_ok());
        assert_eq!(unit.functions, 2);
        assert!(unit.ir.unwrap().contains("function f(a) es5"));
    }

    #[tokio::test]
    async fn test_validate_only_reports_diagnostics() {
        let frontend = AsyncFrontend::new(FrontendConfig::default()).with_validate_only(true);
        let unit = frontend
            .compile_source("t.js".into(), "x: x: ;".into())
            .await
            .unwrap();
        assert!(!unit.is_ok());
        assert!(unit.ir.is_none());
        assert!(unit.diagnostics[0].starts_with("t.js:1:4: error:"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let frontend = AsyncFrontend::default();
        let result = frontend.compile_file("/nonexistent/file.js").await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_force_lazy_lowers_every_body() {
        let config = FrontendConfig::new().with_lazy(true).with_lazy_threshold(0);
        let source = "function f() { return 1; }".to_string();

        let lazy = AsyncFrontend::new(config.clone());
        let unit = lazy.compile_source("t.js".into(), source.clone()).await.unwrap();
        assert!(unit.ir.unwrap().contains("function f() es5 lazy"));

        let forced = AsyncFrontend::new(config).with_force_lazy(true);
        let unit = forced.compile_source("t.js".into(), source).await.unwrap();
        let ir = unit.ir.unwrap();
        assert!(ir.contains("function f() es5\n"));
        assert!(ir.contains("Return 1"));
    }
}
