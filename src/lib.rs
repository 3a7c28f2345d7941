pub mod comparison;
pub mod dataset;
pub mod dataset_fetch;
pub mod export;
pub mod feed;
pub mod history_fetch;
pub mod history_store;
pub mod http_cache;
pub mod http_client;
pub mod metrics;
pub mod persist;
pub mod premium;
pub mod rankings;
pub mod sample_data;
pub mod set_pieces;
pub mod state;
pub mod value_score;
