use std::time::Duration;

/// Deliberate delay between messages of a streaming call.
///
/// Purely cosmetic: it makes streams observable at human speed and never affects results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pacing(Duration);

impl Pacing {
    pub fn new(delay: Duration) -> Self {
        Self(delay)
    }

    pub fn delay(&self) -> Duration {
        self.0
    }

    /// Suspend the current task for the configured delay. Never blocks the thread.
    pub async fn pause(self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}
