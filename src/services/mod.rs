pub mod batch;
pub mod credentials;
pub mod settings;
pub mod storage;
pub mod upload_service;
