use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, info_span, Instrument};

use crate::domain::models::qa::{QaRecord, SourceChunk};
use crate::error::AppError;
use crate::state::AppState;

/// Work decoupled from the request/response lifecycle. The Q&A history
/// write runs here so the client never waits on a persistence round-trip,
/// and so a closed connection can never observe its outcome.
pub enum BackgroundJob {
    PersistQaRecord {
        email: String,
        question: String,
        answer: String,
        sources: Vec<SourceChunk>,
    },
    SendWelcomeMail {
        recipient: String,
        display_name: String,
    },
}

impl BackgroundJob {
    fn kind(&self) -> &'static str {
        match self {
            BackgroundJob::PersistQaRecord { .. } => "persist_qa_record",
            BackgroundJob::SendWelcomeMail { .. } => "send_welcome_mail",
        }
    }
}

pub type JobSender = UnboundedSender<BackgroundJob>;

pub fn job_channel() -> (JobSender, UnboundedReceiver<BackgroundJob>) {
    mpsc::unbounded_channel()
}

pub async fn start_background_worker(state: Arc<AppState>, mut rx: UnboundedReceiver<BackgroundJob>) {
    info!("Starting background job worker...");

    while let Some(job) = rx.recv().await {
        let span = info_span!("background_job", job_type = job.kind());

        async {
            match process_job(&state, job).await {
                Ok(_) => info!("Job completed successfully"),
                Err(e) => error!("Job failed with error: {}", e),
            }
        }
        .instrument(span)
        .await;
    }
}

async fn process_job(state: &Arc<AppState>, job: BackgroundJob) -> Result<(), AppError> {
    match job {
        BackgroundJob::PersistQaRecord {
            email,
            question,
            answer,
            sources,
        } => {
            // An empty accumulated answer is never persisted.
            if answer.trim().is_empty() {
                info!("Skipping history write for {}: empty answer", email);
                return Ok(());
            }

            let sources_json = serde_json::to_string(&sources)
                .map_err(|e| AppError::InternalWithMsg(format!("Failed to serialize sources: {e}")))?;

            let record = QaRecord::new(email, question, answer, sources_json);
            state.qa_repo.create(&record).await?;
            info!("Persisted Q&A record {}", record.id);
            Ok(())
        }
        BackgroundJob::SendWelcomeMail {
            recipient,
            display_name,
        } => {
            let mut context = tera::Context::new();
            context.insert("display_name", &display_name);

            let html = state
                .templates
                .render("welcome.html", &context)
                .map_err(|e| AppError::InternalWithMsg(format!("Welcome template render error: {e:?}")))?;

            state
                .email_service
                .send(&recipient, "Welcome to SmartAI Transcriber", &html)
                .await
        }
    }
}
