//! Ordered record of one conversation.

use super::message::{Message, MessageKind, USER_SOURCE};
use std::collections::{BTreeMap, BTreeSet};

/// Sentinel returned when there is nothing to extract.
pub const NO_RESULT: &str = "no result retrieved";

/// Ordered, append-only sequence of messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its index.
    pub fn append(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn chronological(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Last message that is not tool traffic.
    pub fn last_spoken(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| !m.is_tool_traffic())
    }

    pub fn by_agent<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages.iter().filter(move |m| m.source == name)
    }

    /// Distinct sources in order of first appearance.
    pub fn agents(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.messages
            .iter()
            .filter(|m| seen.insert(m.source.as_str()))
            .map(|m| m.source.as_str())
            .collect()
    }

    pub fn kinds(&self) -> BTreeSet<MessageKind> {
        self.messages.iter().map(|m| m.kind).collect()
    }

    /// Message indices grouped by source.
    pub fn agent_groups(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, m) in self.messages.iter().enumerate() {
            groups.entry(m.source.as_str()).or_default().push(i);
        }
        groups
    }

    /// Whether a message carrying the termination token was appended.
    pub fn has_terminal(&self) -> bool {
        self.messages.iter().any(Message::is_terminal)
    }

    /// Artifact of an assembly-style conversation.
    ///
    /// Content of the last text message whose source is not in `excluded`
    /// (and is not the task itself); otherwise the last message; otherwise
    /// [`NO_RESULT`].
    pub fn final_artifact(&self, excluded: &[&str]) -> String {
        self.messages
            .iter()
            .rev()
            .find(|m| {
                m.kind == MessageKind::Text
                    && m.source != USER_SOURCE
                    && !excluded.contains(&m.source.as_str())
                    && !m.content.is_empty()
            })
            .or_else(|| self.last_spoken())
            .map(Message::text_content)
            .unwrap_or_else(|| NO_RESULT.to_string())
    }

    /// Content of the chronologically last spoken message, skipping a bare
    /// termination marker.
    pub fn last_content(&self) -> String {
        self.messages
            .iter()
            .rev()
            .find(|m| !m.is_tool_traffic() && !m.is_terminal())
            .map(Message::text_content)
            .unwrap_or_else(|| NO_RESULT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::ToolCall;

    fn sample() -> Transcript {
        let mut t = Transcript::new();
        t.append(Message::task("Build the prompt"));
        t.append(Message::text("Planner", "Context_Retrieval, gather context"));
        t.append(Message::tool_call("Context_Retrieval", vec![ToolCall::new("run_local_query")]));
        t.append(Message::text("Context_Retrieval", "Project is a bank portal"));
        t.append(Message::text("Planner", "Context_Retrieval_Critic, score it"));
        t.append(Message::text("Context_Retrieval_Critic", "Score: 8/10"));
        t
    }

    #[test]
    fn test_views() {
        let t = sample();
        assert_eq!(t.len(), 6);
        assert_eq!(t.by_agent("Planner").count(), 2);
        assert_eq!(
            t.agents(),
            vec!["user", "Planner", "Context_Retrieval", "Context_Retrieval_Critic"]
        );
        assert_eq!(t.agent_groups()["Context_Retrieval"], vec![2, 3]);
        assert!(t.kinds().contains(&MessageKind::ToolCall));
    }

    #[test]
    fn test_final_artifact_skips_excluded_sources() {
        let t = sample();
        let artifact = t.final_artifact(&["Planner", "Context_Retrieval_Critic"]);
        assert_eq!(artifact, "Project is a bank portal");
    }

    #[test]
    fn test_final_artifact_falls_back_to_last_message() {
        let mut t = Transcript::new();
        t.append(Message::task("task"));
        t.append(Message::text("Planner", "nothing to delegate"));
        assert_eq!(t.final_artifact(&["Planner"]), "nothing to delegate");
    }

    #[test]
    fn test_empty_transcript_yields_sentinel() {
        let t = Transcript::new();
        assert_eq!(t.final_artifact(&[]), NO_RESULT);
        assert_eq!(t.last_content(), NO_RESULT);
    }

    #[test]
    fn test_last_content_skips_terminal_marker() {
        let mut t = Transcript::new();
        t.append(Message::text("gen", "Scenario 1 ..."));
        t.append(Message::text("gen", "TERMINATE"));
        assert!(t.has_terminal());
        assert_eq!(t.last_content(), "Scenario 1 ...");
    }
}
