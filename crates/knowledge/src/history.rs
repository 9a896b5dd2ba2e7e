//! Conversation history normalization and rendering.

use crate::types::{ConversationTurn, HistoryEntry, Role};

/// Turn raw history strings into role-tagged turns.
///
/// Roles alternate by position starting with `Human`. No validation is
/// applied; an empty slice yields an empty history.
pub fn normalize_history(raw: &[String]) -> Vec<ConversationTurn> {
    raw.iter()
        .enumerate()
        .map(|(i, text)| ConversationTurn::new(Role::from_position(i), text.clone()))
        .collect()
}

/// Turn caller history entries into role-tagged turns.
///
/// Tagged entries keep their role. Plain entries take the role implied by
/// their position in the whole sequence.
pub fn normalize_entries(entries: &[HistoryEntry]) -> Vec<ConversationTurn> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            HistoryEntry::Tagged { role, text } => ConversationTurn::new(*role, text.clone()),
            HistoryEntry::Plain(text) => {
                ConversationTurn::new(Role::from_position(i), text.clone())
            }
        })
        .collect()
}

/// Render turns as `"<role>: <text>"` lines in chronological order.
pub fn render_history(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_history() {
        assert!(normalize_history(&[]).is_empty());
        assert_eq!(render_history(&[]), "");
    }

    #[test]
    fn test_roles_alternate_from_human() {
        let turns = normalize_history(&strings(&["q1", "a1", "q2", "a2", "q3"]));

        assert_eq!(turns.len(), 5);
        for (i, turn) in turns.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::Human } else { Role::Assistant };
            assert_eq!(turn.role, expected);
        }
        assert_eq!(turns[4].text, "q3");
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        let turns = normalize_history(&strings(&["  spaced\nline  ", ""]));
        assert_eq!(turns[0].text, "  spaced\nline  ");
        assert_eq!(turns[1].text, "");
    }

    #[test]
    fn test_tagged_roles_override_position() {
        let entries = vec![
            HistoryEntry::Tagged {
                role: Role::Assistant,
                text: "Welcome! Ask me about our policies.".to_string(),
            },
            HistoryEntry::from("What is the refund policy?"),
            HistoryEntry::from("Refunds are available within 30 days."),
        ];

        let turns = normalize_entries(&entries);
        assert_eq!(turns[0].role, Role::Assistant);
        // plain entries still follow their position
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[2].role, Role::Human);
    }

    #[test]
    fn test_plain_entries_match_string_history() {
        let raw = strings(&["What is the refund policy?", "Refunds are available within 30 days."]);
        let entries: Vec<HistoryEntry> = raw.iter().cloned().map(HistoryEntry::from).collect();

        assert_eq!(normalize_entries(&entries), normalize_history(&raw));
    }

    #[test]
    fn test_render_history() {
        let turns = normalize_history(&strings(&[
            "What is the refund policy?",
            "Refunds are available within 30 days.",
        ]));

        assert_eq!(
            render_history(&turns),
            "Human: What is the refund policy?\nAssistant: Refunds are available within 30 days."
        );
    }
}
