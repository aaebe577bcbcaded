// pelagos_sim/src/simulation/core/topics.rs

//! The node's output channel: named, bounded, best-effort topic buffers.
//!
//! Publication is fire-and-forget. A topic keeps the most recent
//! `capacity` messages and drops the oldest when nobody drains it, so a
//! slow or absent consumer never blocks a publishing loop.

use bevy::prelude::*;
use downcast_rs::{impl_downcast, Downcast};
use std::any::TypeId;
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;

/// Topic carrying the wire-encoded point cloud of the active submap.
pub const POINT_CLOUD_TOPIC: &str = "survey/pointcloud";
/// Topic carrying the wire-encoded vehicle state updates.
pub const ODOMETRY_TOPIC: &str = "auv/odometry";

// --- Trait for Type-Erased Topics ---
/// Allows storing topics of different message types in one map.
pub trait AnyTopic: Downcast + Send + Sync {}
impl_downcast!(AnyTopic);

impl<T: Clone + Send + Sync + 'static> AnyTopic for Topic<T> {}

/// A message stored within a Topic, wrapping the data with a unique ID for
/// cursor tracking.
#[derive(Clone, Debug)]
pub struct StampedMessage<T> {
    pub id: u64,
    pub message: T,
}

/// A generic, single-topic ring buffer.
#[derive(Debug)]
pub struct Topic<T: Clone + Send + Sync + 'static> {
    buffer: VecDeque<StampedMessage<T>>,
    next_id: u64,
    capacity: usize,
}

impl<T: Clone + Send + Sync + 'static> Topic<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            next_id: 0,
            capacity,
        }
    }

    pub fn publish(&mut self, message: T) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(StampedMessage {
            id: self.next_id,
            message,
        });
        self.next_id += 1;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Total number of messages ever published, including dropped ones.
    pub fn published_count(&self) -> u64 {
        self.next_id
    }

    pub fn latest(&self) -> Option<&StampedMessage<T>> {
        self.buffer.back()
    }
}

/// A cursor over a named topic. Each call to [`TopicReader::read`] yields
/// only messages not seen by this reader before; messages dropped by the
/// ring buffer in the meantime are simply gone.
#[derive(Debug)]
pub struct TopicReader<T: 'static> {
    pub topic_name: String,
    last_id_read: Option<u64>,
    _phantom: PhantomData<T>,
}

impl<T: 'static> TopicReader<T> {
    pub fn new(topic_name: &str) -> Self {
        Self {
            topic_name: topic_name.to_string(),
            last_id_read: None,
            _phantom: PhantomData,
        }
    }

    pub fn read<'a, U: Clone + Send + Sync + 'static>(
        &mut self,
        topic: &'a Topic<U>,
    ) -> impl Iterator<Item = &'a StampedMessage<U>> {
        let start_index = match self.last_id_read {
            None => 0,
            Some(last_id) => topic
                .buffer
                .iter()
                .position(|msg| msg.id > last_id)
                .unwrap_or(topic.buffer.len()),
        };

        if let Some(newest) = topic.buffer.back() {
            self.last_id_read = Some(newest.id);
        }
        topic.buffer.range(start_index..)
    }
}

// --- Topic Metadata and Discovery ---

/// Metadata tag for classifying topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicTag {
    PointCloud,
    Odometry,
}

/// All information about a single topic on the bus.
pub struct TopicInfo {
    pub buffer: Box<dyn AnyTopic>,
    pub topic_type: TypeId,
    pub tag: TopicTag,
}

// --- The Main TopicBus Resource ---
#[derive(Resource, Default)]
pub struct TopicBus {
    topics: HashMap<String, TopicInfo>,
}

impl TopicBus {
    pub fn create_topic<T: Clone + Send + Sync + 'static>(
        &mut self,
        name: &str,
        capacity: usize,
        tag: TopicTag,
    ) {
        if self.topics.contains_key(name) {
            panic!("Topic '{}' already exists!", name);
        }
        self.topics.insert(
            name.to_string(),
            TopicInfo {
                buffer: Box::new(Topic::<T>::new(capacity)),
                topic_type: TypeId::of::<T>(),
                tag,
            },
        );
    }

    /// Publishes best-effort. Returns `false` when the topic does not exist
    /// or carries a different message type; the caller logs and moves on.
    pub fn publish<T: Clone + Send + Sync + 'static>(
        &mut self,
        topic_name: &str,
        message: T,
    ) -> bool {
        if let Some(info) = self.topics.get_mut(topic_name) {
            if let Some(topic) = info.buffer.downcast_mut::<Topic<T>>() {
                topic.publish(message);
                return true;
            }
        }
        false
    }

    pub fn get_topic<T: Clone + Send + Sync + 'static>(
        &self,
        topic_name: &str,
    ) -> Option<&Topic<T>> {
        self.topics
            .get(topic_name)
            .and_then(|info| info.buffer.downcast_ref::<Topic<T>>())
    }

    pub fn topics_with_tag(&self, target: TopicTag) -> Vec<String> {
        self.topics
            .iter()
            .filter(|(_, info)| info.tag == target)
            .map(|(name, _)| name.clone())
            .collect()
    }
}
