//! Bulk import from a workbook with the sheets `Pickup point`, `User`, `Product` and
//! `Order`.
//!
//! An import either replaces every non-superuser row or changes nothing. The workbook is
//! parsed and resolved in memory first; the store is only touched by the final
//! transactional replace.

mod apply;
pub mod dataset;
pub mod items;
pub mod workbook;

use std::path::{Path, PathBuf};

use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use thiserror::Error;

use crate::assets::PhotoStorage;

pub use dataset::ImportDataset;
pub use workbook::{Sheet, Workbook};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Cannot read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Workbook has no sheet named {0:?}")]
    MissingSheet(String),

    #[error("Malformed row {row} in sheet {sheet:?}: {reason}")]
    MalformedRow {
        sheet: &'static str,
        row: usize,
        reason: String,
    },

    #[error("Cannot hash credential: {0}")]
    Credential(String),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Reject item tokens without a quantity and unknown SKUs instead of skipping them.
    pub strict_items: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub pickup_points: usize,
    pub users: usize,
    pub products: usize,
    pub orders: usize,
    pub order_items: usize,
    pub skipped_items: usize,
    pub ambiguous_clients: Vec<String>,
    /// Photo files of the replaced products that are gone after the import.
    pub removed_photos: usize,
}

/// Imports the workbook at `path`, replacing all non-superuser data.
pub async fn run_import(
    conn: &DatabaseConnection,
    photos: &PhotoStorage,
    path: impl AsRef<Path>,
    options: ImportOptions,
) -> Result<ImportSummary, ImportError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.to_path_buf()));
    }
    tracing::info!(path = %path.display(), "reading workbook");
    let workbook = Workbook::open(path)?;
    import_workbook(conn, photos, &workbook, options).await
}

/// Imports an already loaded workbook.
pub async fn import_workbook(
    conn: &DatabaseConnection,
    photos: &PhotoStorage,
    workbook: &Workbook,
    options: ImportOptions,
) -> Result<ImportSummary, ImportError> {
    let dataset = ImportDataset::parse(workbook, &options)?;
    let (mut summary, stale) = apply::replace_all(conn, dataset).await?;
    summary.removed_photos = stale.release(photos).await;

    tracing::info!(
        pickup_points = summary.pickup_points,
        users = summary.users,
        products = summary.products,
        orders = summary.orders,
        order_items = summary.order_items,
        skipped_items = summary.skipped_items,
        removed_photos = summary.removed_photos,
        "import finished"
    );
    Ok(summary)
}
