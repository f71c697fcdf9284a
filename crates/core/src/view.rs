//! View model consumed by the renderer
//!
//! A snapshot of what should be on screen: category tabs with counts, the tag
//! chip list, and the visible cards. The renderer draws it and sends user
//! actions back as commands; it makes no decisions of its own.

use serde::Serialize;

use crate::prompt::{Prompt, Source};
use crate::store::PromptStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub active:       Source,
    pub search_query: String,
    pub tag_filter:   String,
    pub categories:   Vec<CategoryTab>,
    pub tags:         Vec<TagChip>,
    pub cards:        Vec<PromptCard>,
    pub empty_state:  Option<EmptyState>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTab {
    pub source: Source,
    pub label:  &'static str,
    pub count:  usize,
    pub active: bool,
}

/// Tag filter chip; the empty tag is the "All" chip
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagChip {
    pub tag:    String,
    pub label:  String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptCard {
    pub id:            String,
    pub title:         String,
    pub content_lines: Vec<String>,
    pub tags:          Vec<String>,
    /// Edit/delete controls are only offered for local prompts
    pub editable:      bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyState {
    pub message:       &'static str,
    pub can_add_first: bool,
}

pub fn category_label(source: Source) -> &'static str {
    match source {
        Source::Local => "Local prompts",
        Source::Online => "Online prompts",
    }
}

impl ViewModel {
    /// Project the store's current state
    pub fn build(store: &PromptStore) -> Self {
        let active = store.selected();
        let counts = store.counts();

        let categories = [Source::Local, Source::Online]
            .into_iter()
            .map(|source| CategoryTab {
                source,
                label: category_label(source),
                count: match source {
                    Source::Local => counts.local,
                    Source::Online => counts.online,
                },
                active: source == active,
            })
            .collect();

        let tags = tag_chips(&store.tags(), store.tag_filter());

        let cards: Vec<PromptCard> = store.filter().into_iter().map(card).collect();
        let empty_state = cards.is_empty().then_some(EmptyState {
            message:       "No prompts",
            can_add_first: active == Source::Local,
        });

        Self {
            active,
            search_query: store.search_query().to_string(),
            tag_filter: store.tag_filter().to_string(),
            categories,
            tags,
            cards,
            empty_state,
        }
    }
}

fn tag_chips(tags: &[String], selected: &str) -> Vec<TagChip> {
    if tags.is_empty() {
        return Vec::new();
    }

    let all = TagChip {
        tag:    String::new(),
        label:  "All".to_string(),
        active: selected.is_empty(),
    };
    std::iter::once(all)
        .chain(tags.iter().map(|tag| TagChip {
            tag:    tag.clone(),
            label:  tag.clone(),
            active: tag == selected,
        }))
        .collect()
}

fn card(prompt: &Prompt) -> PromptCard {
    PromptCard {
        id:            prompt.id.clone(),
        title:         prompt.title.clone(),
        content_lines: prompt.content.split('\n').map(str::to_string).collect(),
        tags:          prompt.tags.clone(),
        editable:      prompt.source == Source::Local,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::db::MemoryKeyValueStore;

    fn store() -> PromptStore {
        PromptStore::new(Arc::new(MemoryKeyValueStore::new()), "localPrompts")
    }

    #[test]
    fn test_empty_local_view() {
        let view = ViewModel::build(&store());

        assert_eq!(view.active, Source::Local);
        assert!(view.cards.is_empty());
        assert!(view.tags.is_empty());
        assert_eq!(
            view.empty_state,
            Some(EmptyState { message: "No prompts", can_add_first: true })
        );
        assert_eq!(view.categories.len(), 2);
        assert!(view.categories[0].active);
        assert_eq!(view.categories[0].count, 0);
    }

    #[test]
    fn test_empty_online_view_has_no_add_button() {
        let mut store = store();
        store.select_collection(Source::Online);
        let view = ViewModel::build(&store);
        assert!(!view.empty_state.unwrap().can_add_first);
        assert!(view.categories[1].active);
    }

    #[test]
    fn test_cards_and_chips() {
        let mut store = store();
        store
            .create("Greeting", "Hello\nWorld", &["a".to_string(), "b".to_string()])
            .unwrap();
        store.set_tag_filter("a");

        let view = ViewModel::build(&store);
        assert!(view.empty_state.is_none());
        assert_eq!(view.cards.len(), 1);

        let card = &view.cards[0];
        assert_eq!(card.title, "Greeting");
        assert_eq!(card.content_lines, vec!["Hello", "World"]);
        assert!(card.editable);

        let chips: Vec<(&str, bool)> = view.tags.iter().map(|c| (c.label.as_str(), c.active)).collect();
        assert_eq!(chips, vec![("All", false), ("a", true), ("b", false)]);
    }

    #[test]
    fn test_online_cards_are_read_only() {
        let mut store = store();
        let ticket = store.begin_fetch();
        store.finish_fetch(
            ticket,
            Ok(vec![serde_json::from_value(json!({"title": "T", "content": "C"})).unwrap()]),
        );
        store.select_collection(Source::Online);

        let view = ViewModel::build(&store);
        assert_eq!(view.categories[1].count, 1);
        assert!(!view.cards[0].editable);
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(ViewModel::build(&store())).unwrap();
        assert_eq!(value["active"], json!("local"));
        assert_eq!(value["emptyState"]["canAddFirst"], json!(true));
        assert_eq!(value["categories"][1]["label"], json!("Online prompts"));
    }
}
