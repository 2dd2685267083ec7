use super::search_interface::RetrievedDocument;

/// Render documents as display blocks, one per document, in input order.
pub fn format_context(documents: &[RetrievedDocument]) -> Vec<String> {
    documents.iter().map(format_document).collect()
}

fn format_document(doc: &RetrievedDocument) -> String {
    match doc.url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => format!("{}\n{}\nИсточник: {}", doc.title, doc.content, url),
        None => format!("{}\n{}", doc.title, doc.content),
    }
}
