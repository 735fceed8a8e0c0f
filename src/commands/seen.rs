use std::path::PathBuf;

use anyhow::{Context, Result};
use calrelay_core::dedup;

use crate::config::{self, Config};

/// Print whether each id has already been processed.
pub fn run(cfg: &Config, ids: &[String], db: Option<PathBuf>) -> Result<()> {
    let path = cfg.store_path(&config::data_dir()?, db.as_deref());
    let store = dedup::open_store(cfg.store.backend, &path)
        .with_context(|| format!("Failed to open dedup store at {}", path.display()))?;

    for id in ids {
        let seen = store
            .exists(id)
            .with_context(|| format!("Failed to look up {}", id))?;
        println!("{}\t{}", if seen { "seen" } else { "new" }, id);
    }

    Ok(())
}
