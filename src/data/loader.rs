//! Catalog and build file loading. One file per table in a catalog directory,
//! YAML or JSON by extension. Missing tables degrade to empty/default values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::data::build::CharacterBuild;
use crate::data::catalog::{BuffRow, Catalogs, FormulaTable};
use crate::data::constants::Constants;
use crate::data::item::EquipmentItem;
use crate::data::job::JobDefinition;

pub const DEFAULT_CATALOG_DIR: &str = "data/catalog";

const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse yaml '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unable to parse json '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a YAML or JSON document, chosen by file extension (YAML otherwise).
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&raw).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_yaml::from_str(&raw).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// First existing `<dir>/<table>.{yaml,yml,json}`.
fn table_path(dir: &Path, table: &str) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{table}.{ext}")))
        .find(|path| path.is_file())
}

fn load_table<T: DeserializeOwned + Default>(dir: &Path, table: &str) -> Result<T, LoadError> {
    match table_path(dir, table) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading catalog table");
            read_document(&path)
        }
        None => {
            tracing::debug!(table, dir = %dir.display(), "catalog table absent, using default");
            Ok(T::default())
        }
    }
}

/// Load every catalog table from `dir`. Items are refiled by their declared
/// slot, so a ring listed in `armors` still lands in the accessory table.
pub fn load_catalogs(dir: &Path) -> Result<Catalogs, LoadError> {
    let mut catalogs = Catalogs::new();
    for table in ["weapons", "armors", "accessories"] {
        let items: Vec<EquipmentItem> = load_table(dir, table)?;
        for item in items {
            catalogs.add_item(item);
        }
    }
    catalogs.emblems = load_table::<Vec<BuffRow>>(dir, "emblems")?;
    catalogs.runes = load_table::<Vec<BuffRow>>(dir, "runes")?;
    catalogs.foods = load_table::<Vec<BuffRow>>(dir, "foods")?;
    catalogs.jobs = load_table::<Vec<JobDefinition>>(dir, "jobs")?;
    catalogs.formulas = load_table::<FormulaTable>(dir, "formulas")?;
    catalogs.constants = load_table::<Constants>(dir, "constants")?;
    tracing::debug!(
        weapons = catalogs.weapons.len(),
        armors = catalogs.armors.len(),
        accessories = catalogs.accessories.len(),
        jobs = catalogs.jobs.len(),
        "catalogs loaded"
    );
    Ok(catalogs)
}

pub fn load_build(path: &Path) -> Result<CharacterBuild, LoadError> {
    read_document(path)
}
