use futures03::stream::Stream;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use graph::prelude::*;

/// Fans events out to everyone subscribed to their topic.
///
/// Each topic is a bounded broadcast channel. A subscriber that falls more
/// than the buffer size behind loses the oldest events it has not seen
/// yet; publishers never wait for subscribers. Topics are created on first
/// use, either by publishing or subscribing.
pub struct SubscriptionHub<T = Value> {
    logger: Logger,
    topics: RwLock<HashMap<String, Arc<Topic<T>>>>,
    capacity: usize,
    default_replay: ReplayPolicy,
    closed: AtomicBool,
}

struct Topic<T> {
    // Publishing and subscribing lock this, so that a new subscriber sees
    // every event either through replay or live, never both or neither
    state: Mutex<TopicState<T>>,
}

struct TopicState<T> {
    sender: Option<broadcast::Sender<T>>,
    latest: Option<T>,
    replay: ReplayPolicy,
}

impl<T: Clone + Send + Sync + 'static> SubscriptionHub<T> {
    /// A hub configured through the environment.
    pub fn new(logger: &Logger) -> Self {
        Self::with_config(
            logger,
            ENV_VARS.subscription_buffer(),
            ENV_VARS.subscription_replay(),
        )
    }

    pub fn with_config(logger: &Logger, capacity: usize, default_replay: ReplayPolicy) -> Self {
        SubscriptionHub {
            logger: logger.new(o!("component" => "SubscriptionHub")),
            topics: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            default_replay,
            closed: AtomicBool::new(false),
        }
    }

    fn topic(&self, event: &str) -> Arc<Topic<T>> {
        if let Some(topic) = self.topics.read().get(event) {
            return topic.cheap_clone();
        }

        let mut topics = self.topics.write();
        topics
            .entry(event.to_owned())
            .or_insert_with(|| {
                let sender = if self.closed.load(Ordering::SeqCst) {
                    None
                } else {
                    Some(broadcast::channel(self.capacity).0)
                };
                Arc::new(Topic {
                    state: Mutex::new(TopicState {
                        sender,
                        latest: None,
                        replay: self.default_replay,
                    }),
                })
            })
            .cheap_clone()
    }

    /// Set the replay policy of the topic for `event`.
    pub fn register(&self, event: &str, replay: ReplayPolicy) {
        let topic = self.topic(event);
        let mut state = topic.state.lock();
        state.replay = replay;
        if replay == ReplayPolicy::None {
            state.latest = None;
        }
    }

    /// Deliver `value` to every current subscriber of `event`. Returns the
    /// number of subscribers that received it; publishing with nobody
    /// listening is not an error.
    pub fn publish(&self, event: &str, value: T) -> Result<usize, SubscriptionPublishError> {
        let topic = self.topic(event);
        let mut state = topic.state.lock();

        let sender = match &state.sender {
            Some(sender) => sender.clone(),
            None => return Err(SubscriptionPublishError::Closed(event.to_owned())),
        };
        if state.replay == ReplayPolicy::Latest {
            state.latest = Some(value.clone());
        }
        Ok(sender.send(value).unwrap_or(0))
    }

    /// Publish `value`, logging failures instead of returning them.
    pub fn publish_or_log(&self, event: &str, value: T) {
        match self.publish(event, value) {
            Ok(receivers) => trace!(self.logger, "Published event";
                                    "event" => event,
                                    "receivers" => receivers),
            Err(e) => error!(self.logger, "Failed to publish event";
                             "event" => event,
                             "error" => e.to_string(),
                             "code" => LogCode::SubscriptionPublishFailure),
        }
    }

    /// A stream of the events published to `event` from now on, preceded by
    /// the latest earlier event if the topic replays it. Dropping the
    /// stream unsubscribes.
    pub fn subscribe(&self, event: &str) -> EventStream<T> {
        let topic = self.topic(event);
        let state = topic.state.lock();

        let live = state
            .sender
            .as_ref()
            .map(|sender| BroadcastStream::new(sender.subscribe()));
        let replay = match (state.replay, &live) {
            (ReplayPolicy::Latest, Some(_)) => state.latest.clone(),
            _ => None,
        };

        EventStream {
            logger: self.logger.new(o!("event" => event.to_owned())),
            replay,
            live,
        }
    }

    /// Number of streams currently subscribed to `event`
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.topics
            .read()
            .get(event)
            .and_then(|topic| {
                topic
                    .state
                    .lock()
                    .sender
                    .as_ref()
                    .map(broadcast::Sender::receiver_count)
            })
            .unwrap_or(0)
    }

    /// Close all topics. Subscribers receive what was already published and
    /// then their streams end; publishing fails from now on.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        for topic in self.topics.read().values() {
            let mut state = topic.state.lock();
            state.sender = None;
            state.latest = None;
        }
        debug!(self.logger, "Subscription hub shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// The events of one topic as seen by one subscriber.
pub struct EventStream<T> {
    logger: Logger,
    replay: Option<T>,
    live: Option<BroadcastStream<T>>,
}

impl<T> EventStream<T> {
    /// Stop receiving events. The stream ends right away, even if events
    /// were published but not yet read.
    pub fn unsubscribe(&mut self) {
        self.replay = None;
        self.live = None;
    }
}

// Nothing in the stream is ever pinned in place
impl<T> Unpin for EventStream<T> {}

impl<T: Clone + Send + 'static> Stream for EventStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if let Some(value) = self.replay.take() {
            return Poll::Ready(Some(value));
        }

        loop {
            let live = match self.live.as_mut() {
                Some(live) => live,
                None => return Poll::Ready(None),
            };
            match Pin::new(live).poll_next(cx) {
                Poll::Ready(Some(Ok(value))) => return Poll::Ready(Some(value)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(self.logger, "Subscriber fell behind, dropped events";
                          "dropped" => skipped,
                          "code" => LogCode::SubscriptionLagging);
                }
                Poll::Ready(None) => {
                    self.live = None;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
