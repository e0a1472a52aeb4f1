//! Artifacts generated after the transform stages.
//!
//! - **Sitemap**: per-domain `<urlset>` files plus one `<sitemapindex>`
//! - **Permission**: mode normalization over whatever the sitemap produced

pub mod permission;
pub mod sitemap;
