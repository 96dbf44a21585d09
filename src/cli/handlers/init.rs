use std::error::Error;

use super::Context;
use crate::cli::commands::InitArgs;
use crate::io::config_io;
use crate::io::document_io::{self, StoreError};
use crate::model::document::Document;

/// Create an empty document and, beside it, a commented default config.
/// An existing document is only replaced with `--force`; an existing
/// config is left alone unless forced.
pub fn cmd_init(ctx: &Context, args: InitArgs) -> Result<(), Box<dyn Error>> {
    if ctx.file.exists() && !args.force {
        return Err(StoreError::AlreadyExists(ctx.file.clone()).into());
    }
    if let Some(dir) = ctx.file.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir).map_err(|source| StoreError::WriteError {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    document_io::save_document(&ctx.file, &Document::default())?;

    let config_path = config_io::config_path_for(&ctx.file);
    let wrote_config = if !config_path.exists() || args.force {
        config_io::write_default_config(&config_path)?;
        true
    } else {
        false
    };

    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "document": ctx.file.display().to_string(),
                "config": wrote_config.then(|| config_path.display().to_string()),
            })
        );
    } else {
        println!("Initialized {}", ctx.file.display());
        if wrote_config {
            println!("  wrote {}", config_path.display());
        }
    }
    Ok(())
}
