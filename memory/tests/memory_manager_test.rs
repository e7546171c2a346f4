//! Integration tests for [`memory::MemoryManager`].
//!
//! Uses an in-memory SQLite store and scripted LLM doubles.

use async_trait::async_trait;
use llm_client::{CompletionOptions, LlmClient, StreamChunkCallback};
use memory::{MemoryManager, MAX_SUMMARIES};
use prompt::ChatMessage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use storage::{ConversationRepository, MemoryType};

/// LLM double that replies from a rotating script (wraps around at the end).
struct RotatingLlm {
    replies: Vec<String>,
    calls: AtomicUsize,
}

impl RotatingLlm {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LlmClient for RotatingLlm {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> anyhow::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.replies[n % self.replies.len()].clone())
    }

    async fn complete_stream(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
        _callback: &mut StreamChunkCallback,
    ) -> anyhow::Result<String> {
        self.complete(messages, options).await
    }
}

async fn setup(replies: &[&str]) -> (MemoryManager, ConversationRepository, i64) {
    let repo = ConversationRepository::new("sqlite::memory:")
        .await
        .expect("Failed to create repository");
    let conv = repo.create_conversation(None).await.unwrap();
    let mut manager = MemoryManager::new(RotatingLlm::new(replies), repo.clone());
    manager.bind(conv).await.unwrap();
    (manager, repo, conv)
}

/// **Test: After more than five interactions only the five most recent remain, in order.**
#[tokio::test]
async fn test_summary_fifo_bound() {
    let (mut manager, _repo, _conv) = setup(&[
        "resumen 1", "resumen 2", "resumen 3", "resumen 4", "resumen 5", "resumen 6", "resumen 7",
    ])
    .await;

    for i in 1..=7 {
        manager
            .record_interaction(&format!("pregunta {i}"), "respuesta")
            .await
            .unwrap();
    }

    assert_eq!(manager.summaries().len(), MAX_SUMMARIES);
    assert_eq!(
        manager.summaries(),
        &["resumen 3", "resumen 4", "resumen 5", "resumen 6", "resumen 7"]
    );
}

/// **Test: Summaries survive a reload through the storage blob.**
#[tokio::test]
async fn test_summaries_persisted_and_reloaded() {
    let (mut manager, repo, conv) = setup(&["el usuario saludó"]).await;
    manager.record_interaction("hola", "¡hola!").await.unwrap();

    let blob = repo
        .get_memory(conv, MemoryType::Conversation)
        .await
        .unwrap()
        .expect("summary blob must exist");
    assert!(blob.contains("el usuario saludó"));

    // Fresh manager over the same store sees the same state.
    let mut reloaded = MemoryManager::new(RotatingLlm::new(&["x"]), repo.clone());
    reloaded.bind(conv).await.unwrap();
    assert_eq!(reloaded.summaries(), &["el usuario saludó"]);
}

/// **Test: Fact merge is key-wise overwrite, not append or replace.**
///
/// **Setup:** Extraction yields {"nombre":"Juan"}, then {"mascota":"Max"},
/// then {"nombre":"Ana"}.
/// **Expected:** Final state {"mascota":"Max", "nombre":"Ana"}.
#[tokio::test]
async fn test_personal_fact_merge_overwrites() {
    let (mut manager, _repo, _conv) = setup(&[
        r#"{"nombre": "Juan"}"#,
        r#"{"mascota": "Max"}"#,
        r#"{"nombre": "Ana"}"#,
    ])
    .await;

    manager
        .extract_and_merge_personal_facts("me llamo Juan", "encantado")
        .await
        .unwrap();
    manager
        .extract_and_merge_personal_facts("tengo un perro, Max", "qué bien")
        .await
        .unwrap();
    manager
        .extract_and_merge_personal_facts("en realidad me llamo Ana", "anotado")
        .await
        .unwrap();

    let facts = manager.personal_facts();
    assert_eq!(facts.len(), 2);
    assert_eq!(facts.get("nombre").map(String::as_str), Some("Ana"));
    assert_eq!(facts.get("mascota").map(String::as_str), Some("Max"));
}

/// **Test: Malformed extraction output is treated as "no new facts".**
#[tokio::test]
async fn test_malformed_extraction_ignored() {
    let (mut manager, _repo, _conv) = setup(&["esto no es JSON"]).await;

    manager
        .extract_and_merge_personal_facts("hola", "hola")
        .await
        .unwrap();

    assert!(manager.personal_facts().is_empty());
}

/// **Test: Corrupt persisted blobs reset to empty state on load.**
#[tokio::test]
async fn test_corrupt_blob_resets_to_empty() {
    let repo = ConversationRepository::new("sqlite::memory:").await.unwrap();
    let conv = repo.create_conversation(None).await.unwrap();
    repo.save_memory(conv, MemoryType::Personal, "{{corrupto")
        .await
        .unwrap();
    repo.save_memory(conv, MemoryType::Conversation, "ni siquiera JSON")
        .await
        .unwrap();

    let mut manager = MemoryManager::new(RotatingLlm::new(&["x"]), repo.clone());
    manager.bind(conv).await.unwrap();

    assert!(manager.personal_facts().is_empty());
    assert!(manager.summaries().is_empty());
}

/// **Test: Rebinding another conversation never merges memories.**
#[tokio::test]
async fn test_rebind_discards_previous_state() {
    let (mut manager, repo, _conv) = setup(&[r#"{"nombre": "Juan"}"#]).await;
    manager
        .extract_and_merge_personal_facts("me llamo Juan", "ok")
        .await
        .unwrap();
    assert_eq!(manager.personal_facts().len(), 1);

    let other = repo.create_conversation(None).await.unwrap();
    manager.bind(other).await.unwrap();

    assert!(manager.personal_facts().is_empty());
    assert!(manager.summaries().is_empty());
}

/// **Test: render_context shows facts as "clave: valor" and the last three
/// summaries as "Interacción previa:" lines.**
#[tokio::test]
async fn test_render_context_format() {
    let (mut manager, _repo, _conv) = setup(&[
        r#"{"nombre": "Juan"}"#,
        "resumen A",
        "resumen B",
        "resumen C",
        "resumen D",
    ])
    .await;

    manager
        .extract_and_merge_personal_facts("me llamo Juan", "ok")
        .await
        .unwrap();
    for _ in 0..4 {
        manager.record_interaction("pregunta", "respuesta").await.unwrap();
    }

    let context = manager.render_context();
    assert!(context.contains("nombre: Juan"));
    // Only the last three summaries are rendered.
    assert!(!context.contains("Interacción previa: resumen A"));
    assert!(context.contains("Interacción previa: resumen B"));
    assert!(context.contains("Interacción previa: resumen D"));
}
