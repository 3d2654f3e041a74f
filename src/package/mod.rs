//! Files on disk: run results and publication packages.
//!
//! Nothing here computes scores. Every writer takes results the pipeline
//! already produced and lays them out for people and follow-up tooling.

pub mod discovery;
pub mod results;
pub mod top;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use discovery::{create_discovery_package, DiscoveryPackage, DiscoveryRequest};
pub use results::{prepare_output_dir, write_results, ResultArtifacts};
pub use top::{
    extract_top_discoveries, package_discoveries, package_top_discoveries, DiscoveryDetails, PackagingSummary,
};

/// Author line used in generated documents
pub const CONTACT_EMAIL: &str = "astra@shannonlabs.io";

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write CSV {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to serialize {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PackageError + '_ {
    move |source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn create_dir(path: &Path) -> Result<(), PackageError> {
    std::fs::create_dir_all(path).map_err(io_error(path))
}

fn write_text(path: &Path, contents: &str) -> Result<(), PackageError> {
    std::fs::write(path, contents).map_err(io_error(path))
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PackageError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| PackageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_text(path, &json)
}

/// Write serializable rows as CSV with a header line
fn write_csv<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), PackageError> {
    let csv_error = |source| PackageError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush().map_err(io_error(path))
}
