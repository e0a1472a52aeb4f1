//! Asset class definitions.

/// Class of asset the pipeline transforms.
///
/// Each class owns a glob set (see `[assets]` in the config) and one
/// transform capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    /// JavaScript files.
    Script,
    /// CSS stylesheets.
    Style,
    /// HTML documents.
    Markup,
    /// Raster and vector images.
    Image,
}

impl AssetClass {
    pub const ALL: [Self; 4] = [Self::Script, Self::Style, Self::Markup, Self::Image];

    /// Short name, used as log prefix and config key.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::Markup => "markup",
            Self::Image => "image",
        }
    }

    /// Glob patterns matched when the config does not override them.
    pub fn default_patterns(self) -> Vec<String> {
        let patterns: &[&str] = match self {
            Self::Script => &["**/*.js"],
            Self::Style => &["**/*.css"],
            Self::Markup => &["**/*.html", "**/*.htm"],
            Self::Image => &[
                "**/*.jpeg",
                "**/*.jpg",
                "**/*.png",
                "**/*.gif",
                "**/*.svg",
            ],
        };
        patterns.iter().map(|p| (*p).to_owned()).collect()
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
