//! The per-turn state machine: classify, retrieve, synthesize, remember.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use llm_client::{CompletionOptions, LlmClient, StreamChunkCallback};
use memory::MemoryManager;
use prompt::{
    build_personal_prompt, build_synthesis_prompt, ChatMessage, PERSONAL_SYSTEM, SYNTHESIS_SYSTEM,
};
use retrieval::Retriever;
use storage::{ConversationRepository, DocumentRepository};
use tracing::{error, info, instrument};

use crate::answer::{reconcile_citations, Answer};
use crate::classifier::QueryClassifier;
use crate::metrics::TurnMetrics;

/// Reply when retrieval finds nothing relevant; no synthesis happens.
pub const NO_CONTEXT_APOLOGY: &str = "Lo siento, no encontré información relevante en los \
documentos disponibles para responder tu consulta. ¿Podrías reformular tu pregunta o intentar \
con otra consulta?";

/// Error raised when a document query arrives with no active collection.
pub const NO_DATABASE_SELECTED: &str = "No se ha seleccionado una base de datos";

const SYNTHESIS_TEMPERATURE: f32 = 0.3;
const PERSONAL_TEMPERATURE: f32 = 0.3;

/// The session state a turn runs against: which collection and conversation
/// are active, and the repositories to reach them.
pub struct SessionContext {
    pub active_collection: Option<String>,
    pub conversation_id: i64,
    pub documents: DocumentRepository,
    pub conversations: ConversationRepository,
}

/// Runs one full turn: routes the query through the personal or document
/// branch, streams the reply, reconciles citations, updates memory, and
/// persists both sides of the exchange.
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    classifier: QueryClassifier,
    retriever: Retriever,
    memory: MemoryManager,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, memory: MemoryManager) -> Self {
        Self {
            classifier: QueryClassifier::new(llm.clone()),
            retriever: Retriever::new(llm.clone()),
            llm,
            memory,
        }
    }

    /// Read access to the memory layers, mainly for the CLI status view.
    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    /// Processes one user turn. LLM-side failures degrade to an error answer;
    /// only persistence failures and a missing collection propagate.
    #[instrument(skip(self, ctx, on_chunk), fields(conversation_id = ctx.conversation_id))]
    pub async fn process_turn(
        &mut self,
        ctx: &SessionContext,
        query: &str,
        on_chunk: &mut StreamChunkCallback,
    ) -> Result<Answer> {
        if self.memory.conversation_id() != Some(ctx.conversation_id) {
            self.memory.bind(ctx.conversation_id).await?;
        }

        ctx.conversations
            .save_message(ctx.conversation_id, "user", query)
            .await?;

        let metrics = TurnMetrics::start();
        let answer = if self.classifier.is_document_query(query).await {
            self.document_turn(ctx, query, metrics, on_chunk).await?
        } else {
            self.personal_turn(query, metrics, on_chunk).await?
        };

        ctx.conversations
            .save_message(ctx.conversation_id, "assistant", &answer.to_stored()?)
            .await?;
        Ok(answer)
    }

    /// The conversational branch: answer from memory context alone.
    async fn personal_turn(
        &mut self,
        query: &str,
        mut metrics: TurnMetrics,
        on_chunk: &mut StreamChunkCallback,
    ) -> Result<Answer> {
        let memory_context = self.memory.render_context();
        let messages = vec![
            ChatMessage::system(PERSONAL_SYSTEM),
            ChatMessage::user(build_personal_prompt(&memory_context, query)),
        ];

        let started = Instant::now();
        let response = match self
            .llm
            .complete_stream(
                messages,
                CompletionOptions::new(PERSONAL_TEMPERATURE),
                on_chunk,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Personal reply failed");
                return Ok(Answer {
                    response: format!("Lo siento, ocurrió un error al procesar tu consulta: {e}"),
                    references: Vec::new(),
                    metrics: metrics.finish("Respuesta Personal"),
                });
            }
        };
        metrics.record("generación", started.elapsed());

        // Both calls swallow LLM failures internally; an error here is a
        // failed save and must surface.
        self.memory
            .extract_and_merge_personal_facts(query, &response)
            .await?;
        self.memory.record_interaction(query, &response).await?;

        Ok(Answer {
            response,
            references: Vec::new(),
            metrics: metrics.finish("Respuesta Personal"),
        })
    }

    /// The document branch: retrieve, synthesize with citations, remember.
    async fn document_turn(
        &mut self,
        ctx: &SessionContext,
        query: &str,
        mut metrics: TurnMetrics,
        on_chunk: &mut StreamChunkCallback,
    ) -> Result<Answer> {
        let Some(collection) = ctx.active_collection.as_deref() else {
            bail!(NO_DATABASE_SELECTED);
        };

        // Enrich the raw query with memory context before ranking, so that
        // follow-ups like "¿y el segundo punto?" still rank sensibly.
        let started = Instant::now();
        let enhanced_query = self.enhance_query(query);
        let documents = match ctx.documents.list_documents(Some(collection)).await {
            Ok(docs) => docs,
            Err(e) => {
                error!(error = %e, collection = %collection, "Document listing failed");
                return Ok(Answer {
                    response: format!("Lo siento, ocurrió un error al procesar tu consulta: {e}"),
                    references: Vec::new(),
                    metrics: metrics.finish("Respuesta Documental"),
                });
            }
        };
        metrics.record("preparación", started.elapsed());

        let started = Instant::now();
        let results = self.retriever.select(&enhanced_query, &documents).await;
        metrics.record("búsqueda", started.elapsed());

        if retrieval::is_sentinel_list(&results) {
            info!("No relevant documents, returning apology without synthesis");
            return Ok(Answer {
                response: NO_CONTEXT_APOLOGY.to_string(),
                references: Vec::new(),
                metrics: metrics.finish("Respuesta Documental"),
            });
        }

        // Ordinals follow retrieval order: [1] is the best match.
        let offered: Vec<(usize, String)> = results
            .iter()
            .enumerate()
            .map(|(i, r)| (i + 1, r.metadata.title.clone()))
            .collect();
        let combined_context: String = results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                format!(
                    "Documento [{n}] - {title}:\n{content}\n",
                    n = i + 1,
                    title = r.metadata.title,
                    content = r.content
                )
            })
            .collect();

        let mut messages = vec![ChatMessage::system(SYNTHESIS_SYSTEM)];
        let recent = self.memory.render_recent();
        if !recent.is_empty() {
            messages.push(ChatMessage::user(format!(
                "Contexto de la conversación reciente:\n{recent}"
            )));
        }
        messages.push(ChatMessage::user(build_synthesis_prompt(
            &combined_context,
            query,
        )));

        let started = Instant::now();
        let response = match self
            .llm
            .complete_stream(
                messages,
                CompletionOptions::new(SYNTHESIS_TEMPERATURE),
                on_chunk,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Answer synthesis failed");
                return Ok(Answer {
                    response: format!("Lo siento, ocurrió un error al procesar tu consulta: {e}"),
                    references: Vec::new(),
                    metrics: metrics.finish("Respuesta Documental"),
                });
            }
        };
        metrics.record("generación", started.elapsed());

        let references = reconcile_citations(&response, &offered);
        self.memory.record_interaction(query, &response).await?;

        Ok(Answer {
            response,
            references,
            metrics: metrics.finish("Respuesta Documental"),
        })
    }

    /// Prepends rendered memory context to the raw query for ranking only;
    /// the synthesis prompt always sees the query verbatim.
    fn enhance_query(&self, query: &str) -> String {
        let context = self.memory.render_context();
        if context.is_empty() {
            query.to_string()
        } else {
            format!("{context}\n\nCONSULTA ACTUAL:\n{query}")
        }
    }
}
