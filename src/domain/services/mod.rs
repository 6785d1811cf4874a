pub mod auth_service;
pub mod chunker;
pub mod qa_service;
pub mod upload_service;
