//! `[assets]` section configuration.
//!
//! Glob patterns, relative to the root, selecting each asset class.
//!
//! # Example
//!
//! ```toml
//! [assets]
//! script = ["js/**/*.js"]
//! image = ["**/*.png", "**/*.svg"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::asset::AssetClass;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub script: Vec<String>,
    pub style: Vec<String>,
    pub markup: Vec<String>,
    pub image: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            script: AssetClass::Script.default_patterns(),
            style: AssetClass::Style.default_patterns(),
            markup: AssetClass::Markup.default_patterns(),
            image: AssetClass::Image.default_patterns(),
        }
    }
}

impl AssetsConfig {
    pub const SCRIPT: FieldPath = FieldPath::new("assets.script");
    pub const STYLE: FieldPath = FieldPath::new("assets.style");
    pub const MARKUP: FieldPath = FieldPath::new("assets.markup");
    pub const IMAGE: FieldPath = FieldPath::new("assets.image");

    pub fn patterns(&self, class: AssetClass) -> &[String] {
        match class {
            AssetClass::Script => &self.script,
            AssetClass::Style => &self.style,
            AssetClass::Markup => &self.markup,
            AssetClass::Image => &self.image,
        }
    }

    /// `(class, patterns)` pairs for every class.
    pub fn iter(&self) -> impl Iterator<Item = (AssetClass, &[String])> {
        AssetClass::ALL
            .into_iter()
            .map(|class| (class, self.patterns(class)))
    }

    const fn field(class: AssetClass) -> FieldPath {
        match class {
            AssetClass::Script => Self::SCRIPT,
            AssetClass::Style => Self::STYLE,
            AssetClass::Markup => Self::MARKUP,
            AssetClass::Image => Self::IMAGE,
        }
    }

    /// Patterns must exist and stay relative to the root.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (class, patterns) in self.iter() {
            let field = Self::field(class);
            if patterns.is_empty() {
                diag.error_with_hint(
                    field,
                    format!("no patterns for {class} files"),
                    format!("remove the key to use {:?}", class.default_patterns()),
                );
            }
            for (idx, pattern) in patterns.iter().enumerate() {
                if pattern.trim().is_empty() {
                    diag.error(field, format!("[{idx}] empty pattern"));
                } else if pattern.starts_with('/') || Path::new(pattern).is_absolute() {
                    diag.error_with_hint(
                        field,
                        format!("[{idx}] pattern `{pattern}` must be relative to the root"),
                        format!("use `{}`", pattern.trim_start_matches('/')),
                    );
                }
            }
        }
    }
}
