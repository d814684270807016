//! TOML board description loaded through `--config`.

use std::{fs, path::Path};

use anyhow::{Context, Result as AnyResult};
use galton_board_core::{BoardArea, ConfigPatch};
use serde::Deserialize;

/// Contents of a board description file.
///
/// ```toml
/// [board]
/// row_count = 10
/// deflection_probability = 0.4
///
/// [area]
/// x = 0.0
/// y = 0.0
/// width = 800.0
/// height = 600.0
/// margin = 20.0
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct BoardFile {
    /// Configuration fields to override.
    pub(crate) board: ConfigPatch,
    /// Board area replacing the default layout rectangle.
    pub(crate) area: Option<BoardArea>,
}

/// Reads and parses the board description at `path`.
pub(crate) fn load(path: &Path) -> AnyResult<BoardFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read board file {}", path.display()))?;
    parse(&text).with_context(|| format!("failed to parse board file {}", path.display()))
}

fn parse(text: &str) -> AnyResult<BoardFile> {
    Ok(toml::from_str(text)?)
}
