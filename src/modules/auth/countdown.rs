use std::time::Duration;
use tokio::time::{sleep_until, Instant};

const TICK: Duration = Duration::from_secs(1);

/// Counts a cooldown down against a fixed deadline, one tick per second.
/// Seconds that pass while nobody is waiting are handed out on the next call,
/// so the countdown never runs slower than the clock. Dropping the ticker
/// (or the future returned by `next_tick`) cancels it.
#[derive(Debug)]
pub struct CooldownTicker {
    deadline: Instant,
    remaining: u32,
}

impl CooldownTicker {
    /// `remaining` ticks, the last one landing on `deadline`
    pub fn until(deadline: Instant, remaining: u32) -> Self {
        Self {
            deadline,
            remaining,
        }
    }

    /// Take every tick that is already due, without waiting
    pub fn take_due(&mut self) -> u32 {
        let left = whole_seconds(self.deadline.saturating_duration_since(Instant::now()));
        let due = self.remaining.saturating_sub(left);
        self.remaining -= due;
        due
    }

    /// Wait until at least one tick is due and return how many are.
    /// `None` once the countdown is over.
    pub async fn next_tick(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            let due = self.take_due();
            if due > 0 {
                return Some(due);
            }
            sleep_until(self.next_due()).await;
        }
    }

    fn next_due(&self) -> Instant {
        let ahead = TICK * self.remaining.saturating_sub(1);
        self.deadline.checked_sub(ahead).unwrap_or(self.deadline)
    }
}

/// Seconds left, rounded up
fn whole_seconds(duration: Duration) -> u32 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn start(seconds: u32) -> CooldownTicker {
        CooldownTicker::until(Instant::now() + TICK * seconds, seconds)
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_exact_number_of_ticks() {
        let mut ticker = start(3);
        let started = Instant::now();
        let mut ticks = 0;
        while let Some(due) = ticker.next_tick().await {
            assert_eq!(due, 1);
            ticks += due;
        }
        assert_eq!(ticks, 3);
        let elapsed = Instant::now() - started;
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let mut ticker = start(60);
        let started = Instant::now();
        assert_eq!(ticker.next_tick().await, Some(1));
        let elapsed = Instant::now() - started;
        assert!(elapsed >= Duration::from_secs(1) && elapsed < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_consumer_does_not_stretch_cooldown() {
        let started = Instant::now();
        let mut ticker = start(60);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(ticker.next_tick().await, Some(10));

        let mut ticks = 10;
        while let Some(due) = ticker.next_tick().await {
            ticks += due;
            // Busy again for a while in the middle of the countdown
            if ticks == 30 {
                sleep(Duration::from_millis(4500)).await;
            }
        }
        assert_eq!(ticks, 60);
        let elapsed = Instant::now() - started;
        assert!(elapsed >= Duration::from_secs(60) && elapsed < Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_start_catches_up() {
        // Built three seconds after the cooldown began
        let mut ticker = CooldownTicker::until(Instant::now() + Duration::from_secs(57), 60);
        assert_eq!(ticker.take_due(), 3);
        assert_eq!(ticker.take_due(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_due_after_deadline_drains_everything() {
        let mut ticker = start(5);
        sleep(Duration::from_secs(30)).await;
        assert_eq!(ticker.take_due(), 5);
        assert_eq!(ticker.next_tick().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_count_ends_immediately() {
        let mut ticker = start(0);
        assert!(ticker.next_tick().await.is_none());
    }
}
