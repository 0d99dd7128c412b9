/// Runtime configuration for the store and its effects.
///
/// Controls channel buffer sizes and effect batching behavior. Use the builder
/// pattern to customize, or use [`Default`] for sensible defaults.
///
/// # Examples
///
/// ```rust
/// use stato::Config;
///
/// let config = Config::default()
///     .with_store_channel_capacity(512)            // Larger inbound buffer
///     .with_default_effect_channel_capacity(256)   // Larger effect mailboxes
///     .with_max_actions_per_tick(20);              // Handle more actions per cycle
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Size of each inbound channel of the action loop (store and effects).
    /// Determines how many actions can be queued before dispatchers block.
    /// Default: 256
    store_channel_capacity: usize,

    /// Mailbox capacity for newly registered effects.
    /// An effect whose mailbox overflows is disconnected from the store.
    /// Default: 128
    default_effect_channel_capacity: usize,

    /// Maximum number of actions an effect handles in a single batch
    /// before yielding control back to the scheduler.
    /// Default: 10
    max_actions_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_channel_capacity: 256,
            default_effect_channel_capacity: 128,
            max_actions_per_tick: 10,
        }
    }
}

impl Config {
    /// Set the capacity of the action loop's inbound channels.
    ///
    /// When a channel is full, `dispatch` waits for space (backpressure).
    /// A capacity of zero is raised to one.
    pub fn with_store_channel_capacity(mut self, capacity: usize) -> Self {
        self.store_channel_capacity = capacity.max(1);
        self
    }

    /// Returns the capacity of the action loop's inbound channels.
    pub fn store_channel_capacity(&self) -> usize {
        self.store_channel_capacity
    }

    /// Set the default mailbox capacity for new effects, at least one.
    pub fn with_default_effect_channel_capacity(mut self, capacity: usize) -> Self {
        self.default_effect_channel_capacity = capacity.max(1);
        self
    }

    /// Returns the default mailbox capacity for new effects.
    pub fn default_effect_channel_capacity(&self) -> usize {
        self.default_effect_channel_capacity
    }

    /// Set the maximum number of actions an effect handles per batch.
    ///
    /// Trade-offs:
    /// - Lower values (1-5): better fairness between effects, higher overhead
    /// - Higher values (50-100): better throughput for chatty pipelines
    pub fn with_max_actions_per_tick(mut self, limit: usize) -> Self {
        self.max_actions_per_tick = limit.max(1);
        self
    }

    /// Returns the maximum number of actions an effect handles per batch.
    pub fn max_actions_per_tick(&self) -> usize {
        self.max_actions_per_tick
    }
}
