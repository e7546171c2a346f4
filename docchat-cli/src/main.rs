//! docchat CLI: manage collections, documents, and conversations, and run the
//! interactive chat REPL. Config from env (.env honored) and CLI args.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agents::{Answer, DescriptionGenerator, Orchestrator, SessionContext};
use docchat_cli::{
    database_url, Cli, Commands, CollectionsCommand, ConversationsCommand, DocsCommand,
};
use llm_client::{EnvLlmConfig, LlmClient, StreamChunkCallback};
use memory::MemoryManager;
use storage::{ConversationRepository, DocumentRepository, SqlitePoolManager};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let repos = Repositories::open().await?;

    match cli.command {
        Commands::Chat {
            collection,
            conversation,
        } => handle_chat(repos, collection, conversation).await,
        Commands::Collections(cmd) => handle_collections(repos, cmd).await,
        Commands::Docs(cmd) => handle_docs(repos, cmd).await,
        Commands::Conversations(cmd) => handle_conversations(repos, cmd).await,
    }
}

/// Both repositories over one shared pool on the DOCCHAT_DB database.
struct Repositories {
    documents: DocumentRepository,
    conversations: ConversationRepository,
}

impl Repositories {
    async fn open() -> Result<Self> {
        let url = database_url();
        let pool = SqlitePoolManager::new(&url)
            .await
            .with_context(|| format!("No se pudo abrir la base de datos '{url}'"))?;
        Ok(Self {
            documents: DocumentRepository::with_pool(pool.clone()).await?,
            conversations: ConversationRepository::with_pool(pool).await?,
        })
    }
}

fn build_llm() -> Result<Arc<dyn LlmClient>> {
    let config = EnvLlmConfig::from_env()
        .context("Configura OPENAI_API_KEY (y opcionalmente OPENAI_BASE_URL, MODEL) en .env")?;
    Ok(Arc::new(config.build_client()))
}

/// Callback that prints stream deltas as they arrive and remembers whether
/// anything was printed (short-circuited turns never stream).
fn print_sink(printed: Arc<AtomicBool>) -> Box<StreamChunkCallback> {
    Box::new(move |chunk| {
        let printed = printed.clone();
        Box::pin(async move {
            if !chunk.content.is_empty() {
                printed.store(true, Ordering::SeqCst);
                print!("{}", chunk.content);
                std::io::stdout().flush()?;
            }
            Ok(())
        })
    })
}

async fn handle_chat(
    repos: Repositories,
    collection: String,
    conversation: Option<i64>,
) -> Result<()> {
    if repos.documents.get_collection(&collection).await?.is_none() {
        anyhow::bail!("La colección '{collection}' no existe (crea una con `docchat collections create`)");
    }

    let conversation_id = match conversation {
        Some(id) => id,
        None => repos.conversations.create_conversation(None).await?,
    };

    let llm = build_llm()?;
    let memory = MemoryManager::new(llm.clone(), repos.conversations.clone());
    let mut orchestrator = Orchestrator::new(llm, memory);
    let ctx = SessionContext {
        active_collection: Some(collection.clone()),
        conversation_id,
        documents: repos.documents,
        conversations: repos.conversations,
    };

    println!("docchat — colección '{collection}', conversación {conversation_id}.");
    println!("Escribe tu consulta ('salir' para terminar).\n");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("salir") || query.eq_ignore_ascii_case("exit") {
            break;
        }

        let printed = Arc::new(AtomicBool::new(false));
        let mut sink = print_sink(printed.clone());
        match orchestrator.process_turn(&ctx, query, &mut *sink).await {
            Ok(answer) => {
                if !printed.load(Ordering::SeqCst) {
                    print!("{}", answer.response);
                }
                println!();
                if !answer.references.is_empty() {
                    println!("\nReferencias:");
                    for reference in &answer.references {
                        println!("  {reference}");
                    }
                }
                if let (Some(tipo), Some(total)) =
                    (answer.metrics.get("tipo"), answer.metrics.get("total"))
                {
                    println!("({tipo} — {total})");
                }
                println!();
            }
            Err(e) => eprintln!("Error: {e:#}\n"),
        }
    }

    Ok(())
}

async fn handle_collections(repos: Repositories, cmd: CollectionsCommand) -> Result<()> {
    match cmd {
        CollectionsCommand::List => {
            let collections = repos.documents.list_collections().await?;
            if collections.is_empty() {
                println!("No hay colecciones.");
                return Ok(());
            }
            for c in collections {
                println!(
                    "{:>4}  {:<24} {}  {}",
                    c.id,
                    c.name,
                    c.created_at.format("%d/%m/%Y"),
                    c.description.unwrap_or_default()
                );
            }
        }
        CollectionsCommand::Create { name, description } => {
            let id = repos
                .documents
                .create_collection(&name, description.as_deref())
                .await?;
            println!("Colección '{name}' creada (id {id}).");
        }
        CollectionsCommand::Delete { id } => {
            repos.documents.delete_collection(id).await?;
            println!("Colección {id} eliminada.");
        }
    }
    Ok(())
}

async fn handle_docs(repos: Repositories, cmd: DocsCommand) -> Result<()> {
    match cmd {
        DocsCommand::List { collection } => {
            let docs = repos.documents.list_documents(collection.as_deref()).await?;
            if docs.is_empty() {
                println!("No hay documentos.");
                return Ok(());
            }
            for d in docs {
                println!(
                    "{:>4}  [{}] {:<32} {}",
                    d.id,
                    d.collection,
                    d.title,
                    d.created_at.format("%d/%m/%Y")
                );
            }
        }
        DocsCommand::Add {
            collection,
            file,
            title,
        } => handle_docs_add(repos, collection, file, title).await?,
        DocsCommand::Delete { collection, id } => {
            repos.documents.delete_document(&collection, id).await?;
            println!("Documento {id} eliminado de '{collection}'.");
        }
    }
    Ok(())
}

/// Ingests one plain-text file: reads it, generates the semantic description,
/// and stores the document under the collection.
async fn handle_docs_add(
    repos: Repositories,
    collection: String,
    file: PathBuf,
    title: Option<String>,
) -> Result<()> {
    if repos.documents.get_collection(&collection).await?.is_none() {
        anyhow::bail!("La colección '{collection}' no existe");
    }

    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("No se pudo leer '{}'", file.display()))?;
    let title = title.unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string())
    });
    let filename = file.file_name().map(|n| n.to_string_lossy().to_string());

    println!("Generando descripción semántica...");
    let describer = DescriptionGenerator::new(build_llm()?);
    let description = describer.describe(&content).await;

    let id = repos
        .documents
        .save_document(&collection, &title, &content, &description, filename.as_deref())
        .await?;
    println!("Documento '{title}' agregado a '{collection}' (id {id}).");
    Ok(())
}

async fn handle_conversations(repos: Repositories, cmd: ConversationsCommand) -> Result<()> {
    match cmd {
        ConversationsCommand::List => {
            let conversations = repos.conversations.list_conversations().await?;
            if conversations.is_empty() {
                println!("No hay conversaciones.");
                return Ok(());
            }
            for c in conversations {
                println!(
                    "{:>4}  {:<32} {}",
                    c.id,
                    c.title,
                    c.created_at.format("%d/%m/%Y %H:%M")
                );
            }
        }
        ConversationsCommand::History { id } => {
            let messages = repos.conversations.get_messages(id).await?;
            if messages.is_empty() {
                println!("La conversación {id} no tiene mensajes.");
                return Ok(());
            }
            for message in messages {
                match message.role.as_str() {
                    "user" => println!("> {}", message.content),
                    _ => match Answer::from_stored(&message.content) {
                        Some(answer) => {
                            println!("{}", answer.response);
                            for reference in &answer.references {
                                println!("  {reference}");
                            }
                        }
                        // Plain-text (legacy) assistant messages print as-is.
                        None => println!("{}", message.content),
                    },
                }
                println!();
            }
        }
        ConversationsCommand::Delete { id } => {
            repos.conversations.delete_conversation(id).await?;
            println!("Conversación {id} eliminada.");
        }
    }
    Ok(())
}
