use crate::credentials::Credentials;

pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct Config {
    /// Credentials handed to every device opened by the manager.
    pub credentials: Credentials,
    /// Buffer size of the fleet event channel.
    ///
    /// Subscribers that fall further behind than this lose the oldest events.
    pub event_capacity: usize,
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            quiet: 0,
        }
    }
}

impl Config {
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}
