pub mod category_repo;
pub mod consultant_repo;
pub mod product_repo;
pub mod sync_log_repo;

pub use category_repo::CategoryRepository;
pub use consultant_repo::ConsultantRepository;
pub use product_repo::ProductRepository;
pub use sync_log_repo::SyncLogRepository;
