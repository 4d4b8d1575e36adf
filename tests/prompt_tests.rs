use dataclaro_lib::{
    analysis::prompts::{analysis_prompt, truncate_transcript, SYSTEM_PROMPT},
    core::config::ListKey,
};

#[test]
fn truncation_counts_characters_not_bytes() {
    assert_eq!(truncate_transcript("héllo wörld", 4), "héll");
    assert_eq!(truncate_transcript("日本語テキスト", 3), "日本語");
    assert_eq!(truncate_transcript("short", 100), "short");
    assert_eq!(truncate_transcript("exact", 5), "exact");
    assert_eq!(truncate_transcript("", 10), "");
}

#[test]
fn prompt_embeds_truncated_transcript_last() {
    let transcript = "a".repeat(30);
    let prompt = analysis_prompt(&transcript, 10, ListKey::ActionItems);
    assert!(prompt.ends_with(&format!("Text to analyze: {}", "a".repeat(10))));
    assert!(!prompt.contains(&"a".repeat(11)));
}

#[test]
fn prompt_names_the_configured_list_key() {
    let prompt = analysis_prompt("body", 100, ListKey::ActionItems);
    assert!(prompt.contains("\"action_items\""));
    assert!(!prompt.contains("\"takeaways\""));

    let prompt = analysis_prompt("body", 100, ListKey::Takeaways);
    assert!(prompt.contains("\"takeaways\""));
    assert!(!prompt.contains("\"action_items\""));
}

#[test]
fn prompt_lists_the_four_sections() {
    let prompt = analysis_prompt("body", 100, ListKey::default());
    for needle in ["\"summary\"", "\"key_insights\"", "\"key_statistics\"", "\"page\""] {
        assert!(prompt.contains(needle), "missing {needle}");
    }
    assert!(!SYSTEM_PROMPT.is_empty());
}
