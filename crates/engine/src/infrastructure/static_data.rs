//! Directory-backed static data loader.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::infrastructure::ports::{PortError, StaticDataPort};
use crate::infrastructure::two_da::{TwoDaError, TwoDaTable};

/// Loads `<name>.2da` from a data directory.
pub struct TwoDaDirectory {
    root: PathBuf,
}

impl TwoDaDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.2da", name.to_ascii_lowercase()))
    }
}

#[async_trait]
impl StaticDataPort for TwoDaDirectory {
    async fn load_table(&self, name: &str) -> Result<TwoDaTable, PortError> {
        let path = self.path_for(name);
        match TwoDaTable::from_path(&path).await {
            Ok(table) => {
                tracing::debug!(
                    table = name,
                    rows = table.rows().len(),
                    path = %path.display(),
                    "Loaded 2DA table"
                );
                Ok(table)
            }
            Err(TwoDaError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PortError::not_found("2DA table", path.display()))
            }
            Err(e) => Err(PortError::serialization(format!("{}: {e}", path.display()))),
        }
    }
}
