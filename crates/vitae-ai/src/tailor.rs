//! Resume tailoring on top of a completion backend.

use std::sync::Arc;

use vitae_core::model::{JobPosting, Resume};
use vitae_core::{ErrorKind, Result};

use crate::TRACING_TARGET;
use crate::conversation::{ConversationStore, ThreadRole};
use crate::provider::CompletionBackend;

/// Instruction preamble sent ahead of every tailoring request.
const TAILOR_PREAMBLE: &str = "You are a resume tailoring assistant. Rewrite the \
given resume so it targets the given job posting. Keep every claim truthful to \
the original resume, reorder and reword sections for relevance, and respond \
with exactly one JSON object matching the resume schema you received. Do not \
add commentary.";

/// What a tailoring run produced.
#[derive(Debug, Clone)]
pub struct TailorOutcome {
    /// The tailored resume.
    pub resume: Resume,
    /// Conversation thread the exchange was recorded under.
    pub thread_id: String,
}

/// Tailors resumes against job postings, recording each exchange in the
/// conversation store.
#[derive(Clone)]
pub struct TailorService {
    backend: Arc<dyn CompletionBackend>,
    store: ConversationStore,
}

impl TailorService {
    pub fn new(backend: Arc<dyn CompletionBackend>, store: ConversationStore) -> Self {
        Self { backend, store }
    }

    /// Returns the conversation store this service records into.
    pub fn conversations(&self) -> &ConversationStore {
        &self.store
    }

    /// Produces a tailored variant of `resume` for `posting`.
    ///
    /// History from earlier runs against the same resume id is replayed to
    /// the model so follow-up tailoring stays consistent.
    pub async fn tailor(
        &self,
        resume: &Resume,
        posting: &JobPosting,
        resume_id: &str,
    ) -> Result<TailorOutcome> {
        let thread_id = self.store.ensure_thread(resume_id);
        let history = self.store.history(resume_id);

        let prompt = build_prompt(resume, posting)?;
        let raw = self.backend.complete(&prompt, &history).await?;

        let tailored = parse_resume_reply(&raw).map_err(|error| {
            tracing::warn!(
                target: TRACING_TARGET,
                resume_id,
                error = %error,
                "model reply did not contain a valid resume"
            );
            error
        })?;

        self.store.append(resume_id, ThreadRole::User, prompt);
        self.store.append(resume_id, ThreadRole::Assistant, raw);

        tracing::debug!(
            target: TRACING_TARGET,
            resume_id,
            thread_id = %thread_id,
            sections = tailored.sections.len(),
            "resume tailored"
        );

        Ok(TailorOutcome {
            resume: tailored,
            thread_id,
        })
    }
}

fn build_prompt(resume: &Resume, posting: &JobPosting) -> Result<String> {
    let resume_json = serde_json::to_string_pretty(resume).map_err(|error| {
        ErrorKind::Internal
            .with_message("failed to serialize base resume")
            .with_source(error)
    })?;
    let posting_json = serde_json::to_string_pretty(posting).map_err(|error| {
        ErrorKind::Internal
            .with_message("failed to serialize job posting")
            .with_source(error)
    })?;

    Ok(format!(
        "{TAILOR_PREAMBLE}\n\n# Base resume\n{resume_json}\n\n# Job posting\n{posting_json}"
    ))
}

/// Pulls the resume JSON out of a model reply, tolerating code fences and
/// surrounding prose.
fn parse_resume_reply(raw: &str) -> Result<Resume> {
    let candidate = raw
        .find('{')
        .and_then(|start| raw.rfind('}').map(|end| &raw[start..=end]))
        .ok_or_else(|| {
            ErrorKind::UpstreamFailure.with_message("model reply contained no JSON object")
        })?;

    serde_json::from_str(candidate).map_err(|error| {
        ErrorKind::UpstreamFailure
            .with_message("model reply was not a valid resume")
            .with_source(error)
    })
}
