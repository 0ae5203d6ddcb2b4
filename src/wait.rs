// wait.rs

use std::{error, fmt};

use tokio::time::{sleep, Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitLimit {
    Unbounded,
    Attempts(u32),
    /// Give up once another step would reach this much time since the first check.
    Deadline(Duration),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitTimeout {
    pub attempts: u32,
    pub elapsed: Duration,
}

impl fmt::Display for WaitTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gave up after {} checks in {} ms",
            self.attempts,
            self.elapsed.as_millis()
        )
    }
}

impl error::Error for WaitTimeout {}

/// Poll `check` every `step` until it yields a value or `limit` runs out.
pub async fn poll_until<T, F>(step: Duration, limit: WaitLimit, mut check: F) -> Result<T, WaitTimeout>
where
    F: FnMut() -> Option<T>,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        if let Some(v) = check() {
            return Ok(v);
        }
        attempts += 1;

        let give_up = match limit {
            WaitLimit::Unbounded => false,
            WaitLimit::Attempts(n) => attempts >= n,
            WaitLimit::Deadline(d) => start.elapsed() + step >= d,
        };
        if give_up {
            return Err(WaitTimeout {
                attempts,
                elapsed: start.elapsed(),
            });
        }

        sleep(step).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn returns_first_ready_value() {
        let mut n = 0;
        let v = poll_until(Duration::from_millis(100), WaitLimit::Unbounded, || {
            n += 1;
            (n == 4).then_some(n * 10)
        })
        .await;
        assert_eq!(v, Ok(40));
    }

    #[tokio::test(start_paused = true)]
    async fn ready_on_first_check_does_not_sleep() {
        let start = Instant::now();
        let v = poll_until(Duration::from_secs(1), WaitLimit::Attempts(1), || Some("up")).await;
        assert_eq!(v, Ok("up"));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_limit_counts_checks() {
        let mut n = 0u32;
        let r: Result<(), _> = poll_until(Duration::from_millis(100), WaitLimit::Attempts(5), || {
            n += 1;
            None
        })
        .await;
        let e = r.unwrap_err();
        assert_eq!(n, 5);
        assert_eq!(e.attempts, 5);
        assert_eq!(e.elapsed, Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_of_20s_at_500ms_is_40_checks() {
        let mut n = 0u32;
        let r: Result<(), _> = poll_until(
            Duration::from_millis(500),
            WaitLimit::Deadline(Duration::from_secs(20)),
            || {
                n += 1;
                None
            },
        )
        .await;
        let e = r.unwrap_err();
        assert_eq!(n, 40);
        assert_eq!(e.attempts, 40);
        assert_eq!(e.elapsed, Duration::from_millis(19_500));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_still_catches_late_success() {
        let mut n = 0u32;
        let r = poll_until(
            Duration::from_millis(500),
            WaitLimit::Deadline(Duration::from_secs(20)),
            || {
                n += 1;
                (n == 40).then_some(())
            },
        )
        .await;
        assert!(r.is_ok());
    }
}

// EOF
