pub mod cache;
pub mod pagination;
pub mod service;

pub use cache::{MemoBuilder, MemoCache};
pub use pagination::{page_url, paginate, PageItem, Pagination};
pub use service::MythQueryService;
