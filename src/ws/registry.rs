//! Subscription bookkeeping, shared between the public API and the router.

use std::collections::HashMap;

use async_lock::RwLock;

use crate::ws::{Channel, ChannelCallback, ChannelType, ResubscribePolicy};

/// Tracks which channels are subscribed and the callbacks registered on each.
///
/// Channel identity is the full [`Channel`] pair, so `order_book/0` and
/// `trade/0` are independent entries. Callback order within an entry is
/// registration order.
#[derive(Default)]
pub struct SubscriptionRegistry {
    channels: RwLock<HashMap<Channel, Vec<ChannelCallback>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, creating the channel entry if absent.
    ///
    /// Returns `true` when this is the channel's first callback (i.e. a wire
    /// subscribe is needed).
    pub async fn insert(&self, channel: Channel, callback: ChannelCallback) -> bool {
        let mut channels = self.channels.write().await;
        let entry = channels.entry(channel).or_default();
        entry.push(callback);
        entry.len() == 1
    }

    /// Drop the channel and all of its callbacks. Returns `false` when no
    /// such subscription existed.
    pub async fn remove(&self, channel: &Channel) -> bool {
        self.channels.write().await.remove(channel).is_some()
    }

    /// Snapshot of the callbacks for one channel, in registration order.
    pub async fn callbacks(&self, channel: &Channel) -> Vec<ChannelCallback> {
        self.channels
            .read()
            .await
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn is_subscribed(&self, channel: &Channel) -> bool {
        self.channels.read().await.contains_key(channel)
    }

    /// Channels to replay after a reconnect, applying the resubscribe policy
    /// to the stored callbacks.
    ///
    /// Under [`ResubscribePolicy::FirstOnly`] each channel keeps only its
    /// first-registered callback; the rest are discarded along with the old
    /// connection.
    pub async fn channels_for_resubscribe(&self, policy: ResubscribePolicy) -> Vec<Channel> {
        let mut channels = self.channels.write().await;
        match policy {
            ResubscribePolicy::FirstOnly => {
                for callbacks in channels.values_mut() {
                    callbacks.truncate(1);
                }
            }
        }
        channels
            .iter()
            .filter(|(_, callbacks)| !callbacks.is_empty())
            .map(|(channel, _)| channel.clone())
            .collect()
    }

    /// Subscription counts per channel type.
    pub async fn counts(&self) -> HashMap<ChannelType, usize> {
        let channels = self.channels.read().await;
        let mut counts = HashMap::new();
        for channel in channels.keys() {
            *counts.entry(channel.channel_type).or_insert(0) += 1;
        }
        counts
    }

    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }

    /// Drop every subscription.
    pub async fn clear(&self) {
        self.channels.write().await.clear();
    }
}
