pub mod llm_service;
pub mod transcription;
