//! Synchronous publish/subscribe bus
//!
//! Delivery happens on the publisher's call stack, in subscription order.
//! Nothing is queued between ticks. A callback may publish on other topics
//! while it runs; a callback re-entered through its own publication is
//! skipped for that nested delivery.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use log::warn;
use serde::{Deserialize, Serialize};

use super::controls::Controls;
use super::types::Pose;

/// A pose with the simulation time it was produced at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseStamped {
    pub timestamp: f64,
    pub pose: Pose,
}

/// Published when the primary collider hits other actors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub timestamp: f64,
    /// Names of the actors that were hit
    pub with: Vec<String>,
}

/// Body-frame velocity command (m/s and rad/s)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Twist {
    pub linear: f64,
    pub angular: f64,
}

/// Payloads carried on the bus
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Controls(Controls),
    Pose(PoseStamped),
    Path(Vec<Pose>),
    Collision(CollisionEvent),
    Twist(Twist),
    /// Free-form payload for scripts
    Json(serde_json::Value),
}

/// Handle returned by [`Topics::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Callback = Rc<RefCell<dyn FnMut(&Message)>>;

#[derive(Default)]
struct TopicsInner {
    subscribers: HashMap<String, Vec<(SubscriptionId, Callback)>>,
    next_id: usize,
}

/// Per-simulation topic bus.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct Topics {
    inner: Rc<RefCell<TopicsInner>>,
}

impl fmt::Debug for Topics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let mut topics: Vec<_> = inner.subscribers.keys().collect();
        topics.sort();
        f.debug_struct("Topics").field("topics", &topics).finish()
    }
}

impl Topics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` on `topic`; it runs for every later publication
    pub fn subscribe<F>(&self, topic: impl Into<String>, callback: F) -> SubscriptionId
    where
        F: FnMut(&Message) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        let callback: Callback = Rc::new(RefCell::new(callback));
        inner
            .subscribers
            .entry(topic.into())
            .or_default()
            .push((id, callback));
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        for subs in inner.subscribers.values_mut() {
            if let Some(pos) = subs.iter().position(|(sid, _)| *sid == id) {
                subs.remove(pos);
                return true;
            }
        }
        false
    }

    /// Deliver `message` to every subscriber of `topic`, returning how many
    /// callbacks ran
    pub fn publish(&self, topic: &str, message: &Message) -> usize {
        // release the registry before running callbacks so they can publish
        let callbacks: Vec<Callback> = match self.inner.borrow().subscribers.get(topic) {
            Some(subs) => subs.iter().map(|(_, cb)| Rc::clone(cb)).collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for callback in callbacks {
            match callback.try_borrow_mut() {
                Ok(mut cb) => {
                    (*cb)(message);
                    delivered += 1;
                }
                Err(_) => warn!("skipping re-entrant delivery on {}", topic),
            }
        }
        delivered
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .borrow()
            .subscribers
            .get(topic)
            .map_or(0, Vec::len)
    }

    /// A handle that does not keep the bus alive. Callbacks stored on this
    /// bus publish through one of these.
    pub fn downgrade(&self) -> WeakTopics {
        WeakTopics {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// Non-owning handle to a [`Topics`] bus
#[derive(Clone, Default)]
pub struct WeakTopics {
    inner: Weak<RefCell<TopicsInner>>,
}

impl fmt::Debug for WeakTopics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakTopics")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl WeakTopics {
    pub fn upgrade(&self) -> Option<Topics> {
        self.inner.upgrade().map(|inner| Topics { inner })
    }

    /// Publish if the bus still exists; returns 0 once it has been dropped
    pub fn publish(&self, topic: &str, message: &Message) -> usize {
        self.upgrade()
            .map_or(0, |topics| topics.publish(topic, message))
    }
}

/// `/{actor}/pose`
pub fn pose_topic(actor: &str) -> String {
    format!("/{}/pose", actor)
}

/// `/{actor}/controls`
pub fn controls_topic(actor: &str) -> String {
    format!("/{}/controls", actor)
}

/// `/{actor}/collision`
pub fn collision_topic(actor: &str) -> String {
    format!("/{}/collision", actor)
}

/// `/{actor}/path`
pub fn path_topic(actor: &str) -> String {
    format!("/{}/path", actor)
}
