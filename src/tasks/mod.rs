pub mod summary_refresher;
