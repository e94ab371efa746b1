//! Test utilities and global setup
//!
//! Provides centralized test logging configuration and on-disk fixtures.

/// Test logging utilities
#[cfg(all(test, feature = "test-logging"))]
pub mod logging {
    use std::sync::Once;
    use tracing_subscriber::{EnvFilter, fmt};

    static INIT: Once = Once::new();

    /// Initialize test logging globally - safe to call multiple times
    ///
    /// Respects `RUST_LOG`, defaulting to debug for this crate. Output goes
    /// through the test writer so it only shows for failing tests.
    ///
    /// ```bash
    /// RUST_LOG=trace cargo test --features test-logging
    /// ```
    pub fn init() {
        INIT.call_once(|| {
            let env_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("debug,tokio=info"));

            fmt()
                .with_env_filter(env_filter)
                .with_test_writer()
                .with_target(true)
                .with_thread_ids(true)
                .compact()
                .try_init()
                .ok();
        });
    }
}

/// Auto-initialize test logging for every test in the enclosing module
#[cfg(all(test, feature = "test-logging"))]
#[macro_export]
macro_rules! setup_test_logging {
    () => {
        #[ctor::ctor]
        fn init_test_logging() {
            $crate::test_utils::logging::init();
        }
    };
}

/// Throwaway source trees on disk
#[cfg(test)]
pub mod fixtures {
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Temporary directory holding `files`, given as (relative path, content)
    pub fn source_tree(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (relative, content) in files {
            write_file(dir.path(), relative, content);
        }
        dir
    }

    pub fn write_file(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_source_tree_creates_nested_files() {
            let tree = source_tree(&[("src/a.cpp", "int a;"), ("include/a.hpp", "#pragma once")]);
            assert_eq!(
                fs::read_to_string(tree.path().join("src/a.cpp")).unwrap(),
                "int a;"
            );
            assert!(tree.path().join("include/a.hpp").is_file());
        }
    }
}
