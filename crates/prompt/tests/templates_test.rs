//! Unit tests for the prompt templates (pure string builders, no I/O).

use prompt::{
    build_classification_prompt, build_description_prompt, build_fact_extraction_prompt,
    build_summary_prompt, build_synthesis_prompt, format_document_entry,
};

/// **Test: The classification prompt embeds the query and demands a bare SI/NO.**
#[test]
fn classification_prompt_is_binary() {
    let prompt = build_classification_prompt("¿Qué dice el contrato?");
    assert!(prompt.contains("\"¿Qué dice el contrato?\""));
    assert!(prompt.contains("Responde únicamente SI o NO"));
    // Few-shot examples cover both verdicts.
    assert!(prompt.contains("→ SI"));
    assert!(prompt.contains("→ NO"));
}

/// **Test: The synthesis prompt carries the numbered context and the citation rules.**
#[test]
fn synthesis_prompt_embeds_context_and_citation_rules() {
    let context = "Documento [1] - Manual:\ncontenido\n";
    let prompt = build_synthesis_prompt(context, "¿cómo se usa?");
    assert!(prompt.contains(context));
    assert!(prompt.contains("¿cómo se usa?"));
    assert!(prompt.contains("[1], [2]"));
    assert!(prompt.contains("Nunca inventes referencias"));
}

/// **Test: Document entries for ranking expose id, title, and description.**
#[test]
fn document_entry_lists_id_title_and_description() {
    let entry = format_document_entry("7", "Acta", "Tema: decisiones de la junta");
    assert!(entry.contains("DOCUMENTO 7:"));
    assert!(entry.contains("Título: Acta"));
    assert!(entry.contains("Tema: decisiones de la junta"));
}

/// **Test: Summary and extraction prompts both carry the full exchange.**
#[test]
fn memory_prompts_embed_the_exchange() {
    let summary = build_summary_prompt("hola", "buenos días");
    assert!(summary.contains("USUARIO: hola"));
    assert!(summary.contains("ASISTENTE: buenos días"));
    assert!(summary.contains("UNA sola frase"));

    let extraction = build_fact_extraction_prompt("me llamo Ana", "encantado, Ana");
    assert!(extraction.contains("USUARIO: me llamo Ana"));
    assert!(extraction.contains("objeto JSON plano"));
    assert!(extraction.contains("{}"));
}

/// **Test: The description prompt asks for the four structured sections.**
#[test]
fn description_prompt_requests_structured_sections() {
    let prompt = build_description_prompt("texto del documento");
    assert!(prompt.contains("texto del documento"));
    assert!(prompt.contains("Tema principal"));
    assert!(prompt.contains("Conceptos clave"));
    assert!(prompt.contains("Palabras clave"));
    assert!(prompt.contains("Resumen estructurado"));
}
