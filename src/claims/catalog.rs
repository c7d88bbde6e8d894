//! Reward events shown next to a claim.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::claims::event::Event;
use crate::queue::{HttpQueueClient, QueueResult};

/// A reward (badge) that a campaign can deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEvent {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Source of reward event metadata.
#[async_trait]
pub trait RewardCatalog: Send + Sync {
    async fn reward_events(&self) -> QueueResult<Vec<RewardEvent>>;
}

#[async_trait]
impl RewardCatalog for HttpQueueClient {
    async fn reward_events(&self) -> QueueResult<Vec<RewardEvent>> {
        self.get_json(&self.config().events_path).await
    }
}

/// Rewards belonging to `event`, newest (highest id) first.
pub fn rewards_to_claim(events: &[RewardEvent], event: &Event) -> Vec<RewardEvent> {
    let mut rewards: Vec<RewardEvent> = events
        .iter()
        .filter(|e| event.event_ids.contains(&e.id))
        .cloned()
        .collect();
    rewards.sort_by(|a, b| b.id.cmp(&a.id));
    rewards
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward(id: u64) -> RewardEvent {
        RewardEvent {
            id,
            name: format!("badge {id}"),
            image_url: String::new(),
            description: None,
        }
    }

    #[test]
    fn test_filters_and_sorts_descending() {
        let event = Event {
            key: "drop".to_string(),
            event_ids: [3, 9, 5].into_iter().collect(),
            ..Event::default()
        };
        let all = vec![reward(1), reward(3), reward(5), reward(9), reward(12)];

        let ids: Vec<u64> = rewards_to_claim(&all, &event).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![9, 5, 3]);
    }

    #[test]
    fn test_decodes_backend_listing() {
        let events: Vec<RewardEvent> = serde_json::from_str(
            r#"[{"id": 7, "name": "Summit", "image_url": "https://img/7.png", "year": 2021}]"#,
        )
        .unwrap();
        assert_eq!(events[0].id, 7);
        assert_eq!(events[0].image_url, "https://img/7.png");
    }
}
