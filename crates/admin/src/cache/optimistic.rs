//! Optimistic mutations.
//!
//! A command shows its effect before the server confirms it and puts the
//! previous state back if the server refuses:
//!
//! 1. [`capture`](OptimisticCommand::capture) cancels in-flight reads of the
//!    affected data and saves what is there now
//! 2. [`apply`](OptimisticCommand::apply) writes the expected result locally
//! 3. [`commit`](OptimisticCommand::commit) performs the remote mutation
//! 4. on failure [`revert`](OptimisticCommand::revert) restores the capture;
//!    on success [`settle`](OptimisticCommand::settle) marks the affected data
//!    for refetching
//!
//! Nothing here depends on how the local state is stored.

use std::future::Future;

/// A mutation with a local optimistic effect.
pub trait OptimisticCommand {
    /// Local state saved before the optimistic write.
    type Snapshot: Send;
    /// Value produced by a successful commit.
    type Output: Send;
    /// Error produced by a failed commit.
    type Error: Send;

    fn capture(&self) -> impl Future<Output = Self::Snapshot> + Send;

    fn apply(&self) -> impl Future<Output = ()> + Send;

    fn commit(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;

    fn revert(&self, snapshot: Self::Snapshot) -> impl Future<Output = ()> + Send;

    fn settle(&self, output: &Self::Output) -> impl Future<Output = ()> + Send;
}

/// Run `command` through capture, apply, then commit-or-revert.
///
/// # Errors
///
/// Returns the commit error after the local state has been restored.
pub async fn execute<C>(command: &C) -> Result<C::Output, C::Error>
where
    C: OptimisticCommand + Sync,
{
    let snapshot = command.capture().await;
    command.apply().await;

    match command.commit().await {
        Ok(output) => {
            command.settle(&output).await;
            Ok(output)
        }
        Err(error) => {
            command.revert(snapshot).await;
            Err(error)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Counter increment that the "server" may refuse.
    struct Increment<'a> {
        value: &'a Mutex<i32>,
        log: &'a Mutex<Vec<&'static str>>,
        accept: bool,
    }

    impl Increment<'_> {
        fn record(&self, step: &'static str) {
            self.log.lock().unwrap().push(step);
        }
    }

    impl OptimisticCommand for Increment<'_> {
        type Snapshot = i32;
        type Output = i32;
        type Error = &'static str;

        async fn capture(&self) -> i32 {
            self.record("capture");
            *self.value.lock().unwrap()
        }

        async fn apply(&self) {
            self.record("apply");
            *self.value.lock().unwrap() += 1;
        }

        async fn commit(&self) -> Result<i32, &'static str> {
            self.record("commit");
            if self.accept { Ok(1) } else { Err("refused") }
        }

        async fn revert(&self, snapshot: i32) {
            self.record("revert");
            *self.value.lock().unwrap() = snapshot;
        }

        async fn settle(&self, _output: &i32) {
            self.record("settle");
        }
    }

    #[tokio::test]
    async fn test_success_keeps_optimistic_value() {
        let value = Mutex::new(5);
        let log = Mutex::new(Vec::new());
        let command = Increment {
            value: &value,
            log: &log,
            accept: true,
        };

        assert_eq!(execute(&command).await, Ok(1));
        assert_eq!(*value.lock().unwrap(), 6);
        assert_eq!(
            *log.lock().unwrap(),
            ["capture", "apply", "commit", "settle"]
        );
    }

    #[tokio::test]
    async fn test_failure_restores_snapshot() {
        let value = Mutex::new(5);
        let log = Mutex::new(Vec::new());
        let command = Increment {
            value: &value,
            log: &log,
            accept: false,
        };

        assert_eq!(execute(&command).await, Err("refused"));
        assert_eq!(*value.lock().unwrap(), 5);
        assert_eq!(
            *log.lock().unwrap(),
            ["capture", "apply", "commit", "revert"]
        );
    }
}
