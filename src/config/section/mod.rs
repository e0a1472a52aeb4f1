//! Configuration section definitions.
//!
//! Each module corresponds to a section in `sitepress.toml`:
//!
//! | Module    | TOML Section | Purpose                                  |
//! |-----------|--------------|------------------------------------------|
//! | `assets`  | `[assets]`   | Glob patterns per asset class            |
//! | `sitemap` | `[sitemap]`  | Domains, artifact paths, permission mode |

mod assets;
mod sitemap;

pub use assets::AssetsConfig;
pub use sitemap::SitemapConfig;
