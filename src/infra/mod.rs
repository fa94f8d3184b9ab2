pub mod http_client;
pub mod notice_store;
