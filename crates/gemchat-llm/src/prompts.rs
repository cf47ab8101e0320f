//! Prompt templates wrapped around user input before it reaches the model.

use gemchat_core::{flatten_conversation, Message, SUMMARY_INPUT_LIMIT};

/// Prompt for a single chat turn
pub fn chat_prompt(message: &str) -> String {
    format!(
        "Answer in maximum 150 words, but concise when you can:\n\n{}",
        message
    )
}

/// Prompt asking for a conversation title.
///
/// `text` is expected to be already flattened and truncated.
pub fn summary_prompt(text: &str) -> String {
    format!(
        "Provide a short, concise title (MAX SEVEN WORDS, NO BOLDING) for the following conversation:\n\n{}",
        text
    )
}

/// Flatten `messages` to the `User:`/`Bot:` transcript used for titling
pub fn summary_input(messages: &[Message]) -> String {
    flatten_conversation(messages, SUMMARY_INPUT_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_prompt() {
        assert_eq!(
            chat_prompt("Hi"),
            "Answer in maximum 150 words, but concise when you can:\n\nHi"
        );
    }

    #[test]
    fn test_summary_prompt_embeds_text() {
        let prompt = summary_prompt("User: Hi\nBot: Hello");
        assert!(prompt.starts_with("Provide a short, concise title (MAX SEVEN WORDS, NO BOLDING)"));
        assert!(prompt.ends_with("conversation:\n\nUser: Hi\nBot: Hello"));
    }

    #[test]
    fn test_summary_input_truncates() {
        let messages = vec![Message::user("x".repeat(2000))];
        assert_eq!(summary_input(&messages).chars().count(), SUMMARY_INPUT_LIMIT);
    }
}
