//! Input and output adapters: sitemap documents, the old-URL table and the
//! exported result table.

mod decode;
mod error;
mod export;
mod fetch;
mod old_urls;
mod sitemap;

pub use decode::decode_url;
pub use error::{Result, SourceError};
pub use export::{write_csv, write_json, write_results, write_xlsx, ExportFormat, COLUMNS};
pub use fetch::{
    backoff_delay, existing_sitemaps, sitemap_file_name, SitemapFetcher, DEFAULT_FETCH_ATTEMPTS,
    DEFAULT_MAX_BACKOFF,
};
pub use old_urls::{read_old_urls, read_old_urls_from, read_old_urls_xlsx, URL_COLUMN};
pub use sitemap::{collect_sitemaps, parse_sitemap_file, parse_sitemap_str, SITEMAP_NAMESPACE};
