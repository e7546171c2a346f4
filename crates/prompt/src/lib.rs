//! # Prompt
//!
//! Chat message types and the prompt templates used by the agents.
//!
//! ## Contents
//!
//! - [`ChatMessage`] / [`MessageRole`] – one-to-one with the OpenAI Chat
//!   Completions `messages` array.
//! - Builder functions for every LLM call the system makes: document ranking,
//!   query classification, answer synthesis, personal replies, interaction
//!   summaries, personal-fact extraction, and semantic descriptions.
//!
//! All user-facing templates are Spanish; the assistant answers in the
//! language of the user's documents and questions.

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// System message for the ranking call: select ALL relevant documents, no cap.
pub const RANKING_SYSTEM: &str = "Eres un sistema experto en selección y ranking de documentos. \
Debes seleccionar TODOS los documentos que tengan alguna relevancia con la consulta, sin límite de cantidad.";

/// Builds the ranking prompt over the formatted per-document descriptions.
///
/// The model must answer with a bare JSON array of `{"doc_id", "score"}`
/// objects ordered by score descending.
pub fn build_ranking_prompt(query: &str, formatted_documents: &str) -> String {
    format!(
        "Actúa como un experto en recuperación de información que debe rankear y seleccionar los documentos más relevantes.\n\n\
        CONSULTA DEL USUARIO:\n\
        \"{query}\"\n\n\
        DOCUMENTOS DISPONIBLES:\n\
        {formatted_documents}\n\n\
        TAREA:\n\
        Selecciona y rankea TODOS los documentos relevantes para la consulta del usuario.\n\n\
        CRITERIOS DE SELECCIÓN Y RANKING:\n\
        1. Relevancia directa con la consulta\n\
        2. Especificidad de la información\n\
        3. Completitud de la respuesta\n\
        4. Prioriza documentos que contengan información complementaria\n\n\
        INSTRUCCIONES ESPECÍFICAS:\n\
        1. Incluye TODOS los documentos que tengan alguna relevancia con la consulta\n\
        2. Asigna scores de relevancia:\n\
           - 0.9-1.0: Respuesta directa y muy relevante\n\
           - 0.7-0.8: Información relevante\n\
           - 0.5-0.6: Información parcialmente relevante\n\
           - 0.3-0.4: Información tangencialmente relevante\n\
        3. Ordena los documentos por score de mayor a menor\n\
        4. Incluye documentos incluso si tienen baja relevancia\n\n\
        DEBES RESPONDER EXACTAMENTE EN ESTE FORMATO JSON:\n\
        [\n\
            {{\"doc_id\": \"1\", \"score\": 0.9}},\n\
            {{\"doc_id\": \"2\", \"score\": 0.7}},\n\
            {{\"doc_id\": \"3\", \"score\": 0.4}}\n\
        ]\n\n\
        NO INCLUYAS NADA MÁS EN TU RESPUESTA, SOLO EL JSON."
    )
}

/// Formats one document entry for the ranking prompt.
pub fn format_document_entry(doc_id: &str, title: &str, semantic_description: &str) -> String {
    format!(
        "DOCUMENTO {doc_id}:\n\
        Título: {title}\n\n\
        Descripción Semántica:\n\
        {semantic_description}\n\
        ------------------------\n"
    )
}

/// System message for the binary document/personal classification call.
pub const CLASSIFY_SYSTEM: &str = "Eres un clasificador de consultas. Respondes únicamente SI o NO, \
sin explicaciones ni puntuación adicional.";

/// Builds the SI/NO classification prompt with few-shot examples.
///
/// SI means the query needs document retrieval; NO means it can be answered
/// from conversational or personal context alone.
pub fn build_classification_prompt(query: &str) -> String {
    format!(
        "Decide si la siguiente consulta requiere buscar información en documentos (SI) \
        o si es una declaración personal o conversacional que puede responderse sin documentos (NO).\n\n\
        EJEMPLOS:\n\
        Consulta: \"Mi nombre es Juan\" → NO\n\
        Consulta: \"¿Cómo me llamo?\" → NO\n\
        Consulta: \"Tengo un perro que se llama Max\" → NO\n\
        Consulta: \"Gracias por tu ayuda\" → NO\n\
        Consulta: \"¿Qué dice el manual sobre el mantenimiento?\" → SI\n\
        Consulta: \"Resume el capítulo de seguridad\" → SI\n\
        Consulta: \"¿Cuál es el plazo de garantía según el contrato?\" → SI\n\n\
        CONSULTA:\n\
        \"{query}\"\n\n\
        Responde únicamente SI o NO."
    )
}

/// System message for document-grounded answer synthesis.
pub const SYNTHESIS_SYSTEM: &str = "Eres un asistente experto que proporciona respuestas detalladas \
y precisas basadas en documentos, siempre citando las fuentes con [n].";

/// Builds the synthesis prompt over the combined numbered document context.
pub fn build_synthesis_prompt(combined_context: &str, query: &str) -> String {
    format!(
        "Basándote en los siguientes documentos, responde a la consulta del usuario.\n\n\
        DOCUMENTOS DE REFERENCIA:\n\
        {combined_context}\n\n\
        CONSULTA DEL USUARIO:\n\
        {query}\n\n\
        INSTRUCCIONES:\n\
        1. Analiza cuidadosamente los documentos proporcionados\n\
        2. Responde la consulta del usuario de manera clara y detallada\n\
        3. Incluye referencias a los documentos usando el formato [1], [2], etc.\n\
        4. Si la información no está en los documentos, indícalo claramente\n\
        5. Cita el documento relevante cada vez que menciones información específica\n\
        6. Nunca inventes referencias a documentos que no existen"
    )
}

/// System message for the personal/conversational branch.
pub const PERSONAL_SYSTEM: &str = "Eres un asistente amable y cercano. Usas lo que sabes del usuario \
y de la conversación reciente para responder de forma natural, sin inventar datos.";

/// Builds the personal-reply prompt from the rendered memory context.
pub fn build_personal_prompt(memory_context: &str, query: &str) -> String {
    if memory_context.is_empty() {
        format!(
            "Responde de manera conversacional al siguiente mensaje del usuario.\n\n\
            MENSAJE DEL USUARIO:\n\
            {query}"
        )
    } else {
        format!(
            "Responde de manera conversacional al siguiente mensaje del usuario, \
            teniendo en cuenta lo que sabes de él y de la conversación reciente.\n\n\
            CONTEXTO:\n\
            {memory_context}\n\n\
            MENSAJE DEL USUARIO:\n\
            {query}"
        )
    }
}

/// Builds the one-sentence interaction summary prompt.
pub fn build_summary_prompt(query: &str, response: &str) -> String {
    format!(
        "Resume en UNA sola frase corta la siguiente interacción entre el usuario y el asistente. \
        Responde solo con la frase, sin comillas ni prefijos.\n\n\
        USUARIO: {query}\n\
        ASISTENTE: {response}"
    )
}

/// Builds the personal-fact extraction prompt.
///
/// The model must answer with a flat JSON object (possibly empty) whose keys
/// are fact names and whose values are strings.
pub fn build_fact_extraction_prompt(query: &str, response: &str) -> String {
    format!(
        "Analiza la siguiente interacción y extrae cualquier dato personal que el usuario \
        haya revelado sobre sí mismo (nombre, mascotas, gustos, trabajo, etc.).\n\n\
        USUARIO: {query}\n\
        ASISTENTE: {response}\n\n\
        Responde EXACTAMENTE con un objeto JSON plano de pares \"clave\": \"valor\". \
        Si no hay datos nuevos, responde {{}}.\n\
        Ejemplo: {{\"nombre\": \"Juan\", \"mascota\": \"Max\"}}\n\
        NO INCLUYAS NADA MÁS EN TU RESPUESTA, SOLO EL JSON."
    )
}

/// System message for the semantic description generator.
pub const DESCRIBE_SYSTEM: &str = "Eres un agente especializado en análisis y catalogación de documentos. \
Tu tarea es generar descripciones semánticas detalladas y estructuradas.";

/// Builds the semantic description prompt over raw document text.
pub fn build_description_prompt(text: &str) -> String {
    format!(
        "Analiza el siguiente texto y genera una descripción semántica detallada que incluya:\n\
        1. Tema principal del documento\n\
        2. Conceptos clave\n\
        3. Palabras clave relevantes\n\
        4. Resumen estructurado del contenido\n\n\
        Texto a analizar:\n\
        {text}\n\n\
        Genera una descripción que ayude a futuros agentes a entender el contenido y contexto del documento."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking_prompt_embeds_query_and_documents() {
        let docs = format_document_entry("1", "Manual", "Mantenimiento de equipos");
        let prompt = build_ranking_prompt("¿qué dice el manual?", &docs);
        assert!(prompt.contains("¿qué dice el manual?"));
        assert!(prompt.contains("DOCUMENTO 1:"));
        assert!(prompt.contains("SOLO EL JSON"));
    }

    #[test]
    fn personal_prompt_omits_context_section_when_empty() {
        let without = build_personal_prompt("", "Hola");
        assert!(!without.contains("CONTEXTO:"));
        let with = build_personal_prompt("nombre: Juan", "Hola");
        assert!(with.contains("CONTEXTO:"));
        assert!(with.contains("nombre: Juan"));
    }

    #[test]
    fn chat_message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("a").role, MessageRole::System);
        assert_eq!(ChatMessage::user("b").role, MessageRole::User);
        assert_eq!(ChatMessage::assistant("c").role, MessageRole::Assistant);
    }
}
