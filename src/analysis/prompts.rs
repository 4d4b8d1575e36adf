use crate::core::config::ListKey;

pub const SYSTEM_PROMPT: &str = "You are an expert at analyzing documents and extracting \
key information. \
Focus on the actual content of the document, not its structure or format.";

/// Cuts `text` to at most `max_chars` characters. Never splits a code point.
pub fn truncate_transcript(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub fn analysis_prompt(transcript: &str, max_chars: usize, list_key: ListKey) -> String {
    let key = list_key.as_str();
    let mut text = String::new();
    text.push_str("Analyze the following text from a PDF document and provide:\n");
    text.push_str("1. A brief summary of the main content (max 50 words)\n");
    text.push_str("2. 4-5 key insights or main points from the document, ");
    text.push_str("each with a title and brief explanation\n");
    text.push_str("3. 3-4 important statistics or numbers mentioned in the document, if any\n");
    text.push_str(
        "4. 2-3 action items or recommendations based on the document's content\n\n",
    );
    text.push_str(
        "For every item, set \"page\" to the page number it comes from, or 0 if unknown.\n",
    );
    text.push_str("Respond only with a JSON object in this format:\n");
    text.push_str("{\n");
    text.push_str("  \"summary\": {\"text\": \"Brief summary here\", \"page\": 1},\n");
    text.push_str("  \"key_insights\": [\n");
    text.push_str(
        "    {\"title\": \"Insight Title\", \"explanation\": \"Brief explanation\", \"page\": 1}\n",
    );
    text.push_str("  ],\n");
    text.push_str("  \"key_statistics\": [\n");
    text.push_str("    {\"label\": \"Statistic Label\", \"value\": \"Value\", \"page\": 1}\n");
    text.push_str("  ],\n");
    text.push_str(&format!("  \"{key}\": [\n"));
    text.push_str("    {\"text\": \"Action item 1\", \"page\": 1}\n");
    text.push_str("  ]\n");
    text.push_str("}\n\n");
    text.push_str("Text to analyze: ");
    text.push_str(truncate_transcript(transcript, max_chars));
    text
}
