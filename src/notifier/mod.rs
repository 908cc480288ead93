mod discord;
mod logging;

use async_trait::async_trait;

use crate::{NotifyError, TargetDate, Verdicts};

pub use self::discord::DiscordNotifier;
pub use self::logging::LogNotifier;

/// Outbound alert delivery. Called at most once per cycle with every date
/// that became available in it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        newly_available: &[TargetDate],
        verdicts: &Verdicts,
    ) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Box<T> {
    async fn notify(
        &self,
        newly_available: &[TargetDate],
        verdicts: &Verdicts,
    ) -> Result<(), NotifyError> {
        (**self).notify(newly_available, verdicts).await
    }
}
