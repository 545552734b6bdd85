use async_trait::async_trait;
use uuid::Uuid;

use crate::exchanges::status::ExchangeStatus;

/// Outbound notification dispatcher. Delivery is best-effort: callers log
/// and swallow errors, and no call site runs inside a database transaction.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn exchange_status_changed(
        &self,
        user_id: Uuid,
        exchange_id: Uuid,
        status: ExchangeStatus,
    ) -> anyhow::Result<()>;

    async fn credits_changed(
        &self,
        user_id: Uuid,
        amount: i32,
        balance_after: i32,
    ) -> anyhow::Result<()>;
}

/// Default dispatcher: emits tracing events only. A real push/SignalR-style
/// transport plugs in behind the same trait.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn exchange_status_changed(
        &self,
        user_id: Uuid,
        exchange_id: Uuid,
        status: ExchangeStatus,
    ) -> anyhow::Result<()> {
        tracing::info!(%user_id, %exchange_id, ?status, "exchange status notification");
        Ok(())
    }

    async fn credits_changed(
        &self,
        user_id: Uuid,
        amount: i32,
        balance_after: i32,
    ) -> anyhow::Result<()> {
        tracing::info!(%user_id, amount, balance_after, "credit notification");
        Ok(())
    }
}
