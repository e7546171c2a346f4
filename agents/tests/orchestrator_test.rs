//! Integration tests for [`agents::Orchestrator`].
//!
//! Uses in-memory SQLite repositories and an LLM double that routes on the
//! prompt it receives, so one double serves every call a turn makes.

use async_trait::async_trait;
use llm_client::{CompletionOptions, LlmClient, StreamChunk, StreamChunkCallback};
use prompt::ChatMessage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agents::{Answer, Orchestrator, SessionContext, NO_CONTEXT_APOLOGY, NO_DATABASE_SELECTED};
use memory::MemoryManager;
use storage::{ConversationRepository, DocumentRepository};

/// LLM double that picks its reply from the prompt text, since a single turn
/// issues several different calls (classification, ranking, synthesis,
/// summary, fact extraction).
struct ScriptedLlm {
    classify: String,
    rank: String,
    summary: String,
    extraction: String,
    stream: String,
    stream_calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(classify: &str, rank: &str, stream: &str) -> Arc<Self> {
        Arc::new(Self {
            classify: classify.to_string(),
            rank: rank.to_string(),
            summary: "resumen de la interacción".to_string(),
            extraction: "{}".to_string(),
            stream: stream.to_string(),
            stream_calls: AtomicUsize::new(0),
        })
    }

    fn with_extraction(mut self: Arc<Self>, extraction: &str) -> Arc<Self> {
        Arc::get_mut(&mut self).unwrap().extraction = extraction.to_string();
        self
    }

    fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> anyhow::Result<String> {
        let prompt = &messages.last().expect("empty messages").content;
        if prompt.contains("Responde únicamente SI o NO") {
            Ok(self.classify.clone())
        } else if prompt.contains("CRITERIOS DE SELECCIÓN") {
            Ok(self.rank.clone())
        } else if prompt.contains("objeto JSON plano") {
            Ok(self.extraction.clone())
        } else if prompt.contains("Resume en UNA sola frase") {
            Ok(self.summary.clone())
        } else {
            anyhow::bail!("unexpected non-stream prompt: {prompt}")
        }
    }

    async fn complete_stream(
        &self,
        _messages: Vec<ChatMessage>,
        _options: CompletionOptions,
        callback: &mut StreamChunkCallback,
    ) -> anyhow::Result<String> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        callback(StreamChunk {
            content: self.stream.clone(),
            done: false,
        })
        .await?;
        callback(StreamChunk {
            content: String::new(),
            done: true,
        })
        .await?;
        Ok(self.stream.clone())
    }
}

/// Callback that appends streamed content into a shared buffer.
fn collecting_sink(buffer: Arc<Mutex<String>>) -> Box<StreamChunkCallback> {
    Box::new(move |chunk| {
        let buffer = buffer.clone();
        Box::pin(async move {
            buffer.lock().unwrap().push_str(&chunk.content);
            Ok(())
        })
    })
}

fn discarding_sink() -> Box<StreamChunkCallback> {
    Box::new(|_chunk| Box::pin(async { Ok(()) }))
}

async fn setup(llm: Arc<ScriptedLlm>) -> (Orchestrator, SessionContext) {
    let documents = DocumentRepository::new("sqlite::memory:").await.unwrap();
    let conversations = ConversationRepository::new("sqlite::memory:").await.unwrap();
    let conversation_id = conversations.create_conversation(None).await.unwrap();

    let memory = MemoryManager::new(llm.clone(), conversations.clone());
    let orchestrator = Orchestrator::new(llm, memory);
    let ctx = SessionContext {
        active_collection: Some("manuales".to_string()),
        conversation_id,
        documents,
        conversations,
    };
    (orchestrator, ctx)
}

async fn seed_documents(ctx: &SessionContext) {
    ctx.documents
        .save_document(
            "manuales",
            "Guía de mantenimiento",
            "El mantenimiento preventivo se realiza cada seis meses.",
            "Tema: mantenimiento de equipos",
            None,
        )
        .await
        .unwrap();
    ctx.documents
        .save_document(
            "manuales",
            "Contrato de garantía",
            "La garantía cubre defectos de fabricación por dos años.",
            "Tema: condiciones de garantía",
            None,
        )
        .await
        .unwrap();
}

/// **Test: A document turn returns only the citations the model actually used.**
///
/// **Setup:** Two documents ranked above the floor; the synthesized reply
/// cites only [1].
/// **Expected:** One reference line for ordinal 1; the reply and references
/// survive the persisted-message round trip.
#[tokio::test]
async fn test_document_turn_reconciles_citations() {
    let llm = ScriptedLlm::new(
        "SI",
        r#"[{"doc_id": "1", "score": 0.9}, {"doc_id": "2", "score": 0.7}]"#,
        "El mantenimiento es semestral [1].",
    );
    let (mut orchestrator, ctx) = setup(llm.clone()).await;
    seed_documents(&ctx).await;

    let streamed = Arc::new(Mutex::new(String::new()));
    let mut sink = collecting_sink(streamed.clone());
    let answer = orchestrator
        .process_turn(&ctx, "¿cada cuánto es el mantenimiento?", &mut *sink)
        .await
        .unwrap();

    assert_eq!(answer.response, "El mantenimiento es semestral [1].");
    assert_eq!(answer.references, vec!["[1] Guía de mantenimiento"]);
    assert_eq!(
        answer.metrics.get("tipo").map(String::as_str),
        Some("Respuesta Documental")
    );
    assert!(answer.metrics.contains_key("búsqueda"));
    assert!(answer.metrics.contains_key("generación"));
    assert_eq!(&*streamed.lock().unwrap(), "El mantenimiento es semestral [1].");

    // Both sides of the exchange are persisted; the assistant side decodes.
    let messages = ctx.conversations.get_messages(ctx.conversation_id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "user");
    assert_eq!(messages[1].role, "assistant");
    let stored = Answer::from_stored(&messages[1].content).expect("assistant message decodes");
    assert_eq!(stored.references, vec!["[1] Guía de mantenimiento"]);
}

/// **Test: When nothing is relevant the apology is returned without synthesis.**
///
/// **Setup:** The ranking call returns an empty list and the lexical fallback
/// finds no overlap either.
/// **Expected:** The fixed apology, no references, zero streaming calls, and
/// no interaction recorded in memory.
#[tokio::test]
async fn test_no_relevant_documents_short_circuits_synthesis() {
    let llm = ScriptedLlm::new("SI", "[]", "nunca debería generarse");
    let (mut orchestrator, ctx) = setup(llm.clone()).await;
    seed_documents(&ctx).await;

    let mut sink = discarding_sink();
    let answer = orchestrator
        .process_turn(&ctx, "zzzz", &mut *sink)
        .await
        .unwrap();

    assert_eq!(answer.response, NO_CONTEXT_APOLOGY);
    assert!(answer.references.is_empty());
    assert_eq!(llm.stream_calls(), 0);
    assert!(orchestrator.memory().summaries().is_empty());
}

/// **Test: An unrecognizable classification reply routes to the document
/// branch, which requires an active collection.**
#[tokio::test]
async fn test_classifier_fails_open_to_document_branch() {
    let llm = ScriptedLlm::new("tal vez", "[]", "x");
    let (mut orchestrator, mut ctx) = setup(llm).await;
    ctx.active_collection = None;

    let mut sink = discarding_sink();
    let err = orchestrator
        .process_turn(&ctx, "¿qué dice el manual?", &mut *sink)
        .await
        .unwrap_err();

    assert!(err.to_string().contains(NO_DATABASE_SELECTED));
}

/// **Test: A personal turn updates both memory layers and carries no references.**
#[tokio::test]
async fn test_personal_turn_updates_memory() {
    let llm =
        ScriptedLlm::new("NO", "[]", "¡Encantado, Juan!").with_extraction(r#"{"nombre": "Juan"}"#);
    let (mut orchestrator, ctx) = setup(llm.clone()).await;

    let mut sink = discarding_sink();
    let answer = orchestrator
        .process_turn(&ctx, "Me llamo Juan", &mut *sink)
        .await
        .unwrap();

    assert_eq!(answer.response, "¡Encantado, Juan!");
    assert!(answer.references.is_empty());
    assert_eq!(
        answer.metrics.get("tipo").map(String::as_str),
        Some("Respuesta Personal")
    );
    assert_eq!(llm.stream_calls(), 1);

    let facts = orchestrator.memory().personal_facts();
    assert_eq!(facts.get("nombre").map(String::as_str), Some("Juan"));
    assert_eq!(
        orchestrator.memory().summaries(),
        &["resumen de la interacción"]
    );
}

/// **Test: A second turn in another conversation starts from that
/// conversation's own memory.**
#[tokio::test]
async fn test_turn_rebinds_memory_on_conversation_switch() {
    let llm =
        ScriptedLlm::new("NO", "[]", "¡Hola!").with_extraction(r#"{"nombre": "Juan"}"#);
    let (mut orchestrator, mut ctx) = setup(llm).await;

    let mut sink = discarding_sink();
    orchestrator
        .process_turn(&ctx, "Me llamo Juan", &mut *sink)
        .await
        .unwrap();
    assert_eq!(orchestrator.memory().personal_facts().len(), 1);

    ctx.conversation_id = ctx.conversations.create_conversation(None).await.unwrap();
    let mut sink = discarding_sink();
    orchestrator.process_turn(&ctx, "Hola", &mut *sink).await.unwrap();

    // Had the old binding survived, the summary log would hold two entries.
    assert_eq!(orchestrator.memory().summaries().len(), 1);
    let messages = ctx.conversations.get_messages(ctx.conversation_id).await.unwrap();
    assert_eq!(messages.len(), 2);
}
