// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use chrono::format::{Item, StrftimeItems};

use crate::{Error, Result};

/// Persistence settings shared by a base store and its linked stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    indent: usize,
    timestamp_format: String,
    file_extension: String,
}

impl StoreSettings {
    pub const DEFAULT_INDENT: usize = 4;
    pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
    pub const DEFAULT_FILE_EXTENSION: &str = "txt";

    /// Create settings, rejecting a timestamp format chrono cannot render.
    pub fn new(
        indent: usize,
        timestamp_format: impl Into<String>,
        file_extension: impl Into<String>,
    ) -> Result<Self> {
        let timestamp_format = timestamp_format.into();
        if StrftimeItems::new(&timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::InvalidSettings(format!(
                "'{timestamp_format}' is not a valid timestamp format"
            )));
        }
        let file_extension = file_extension.into();
        if file_extension.is_empty() || file_extension.contains(['/', '\\', '.']) {
            return Err(Error::InvalidSettings(format!(
                "'{file_extension}' is not a valid file extension"
            )));
        }
        Ok(StoreSettings {
            indent,
            timestamp_format,
            file_extension,
        })
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn timestamp_format(&self) -> &str {
        &self.timestamp_format
    }

    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    /// Current local time rendered with the configured format.
    pub fn timestamp_now(&self) -> String {
        chrono::Local::now()
            .format(&self.timestamp_format)
            .to_string()
    }

    pub(crate) fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.file_extension)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            indent: Self::DEFAULT_INDENT,
            timestamp_format: Self::DEFAULT_TIMESTAMP_FORMAT.to_string(),
            file_extension: Self::DEFAULT_FILE_EXTENSION.to_string(),
        }
    }
}
