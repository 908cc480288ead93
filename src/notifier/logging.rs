use async_trait::async_trait;
use log::info;

use super::Notifier;
use crate::{NotifyError, TargetDate, Verdicts};

/// Stand-in used when no webhook is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        newly_available: &[TargetDate],
        _verdicts: &Verdicts,
    ) -> Result<(), NotifyError> {
        let dates: Vec<String> = newly_available.iter().map(ToString::to_string).collect();
        info!("Newly available (no webhook configured): {}", dates.join(", "));
        Ok(())
    }
}
