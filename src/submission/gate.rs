use std::fmt;

use sqlx::PgPool;

use crate::db;
use crate::forms::FormVariant;

/// The status lookup could not be completed.
#[derive(Debug)]
pub struct Degraded {
    pub reason: String,
}

impl fmt::Display for Degraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status lookup degraded: {}", self.reason)
    }
}

impl From<sqlx::Error> for Degraded {
    fn from(err: sqlx::Error) -> Self {
        Degraded {
            reason: err.to_string(),
        }
    }
}

/// Look up the active flag. `Ok(None)` means no status row exists yet.
pub async fn check(pool: &PgPool, variant: FormVariant) -> Result<Option<bool>, Degraded> {
    let status = db::form_status::find(pool, variant).await?;
    Ok(status.map(|s| s.is_active))
}

/// Whether new submissions for `variant` should be accepted. Fails open:
/// a missing row or a failed lookup both count as active.
pub async fn is_accepting(pool: &PgPool, variant: FormVariant) -> bool {
    resolve(variant, check(pool, variant).await, move || async move {
        if let Err(e) = db::form_status::insert_default(pool, variant).await {
            tracing::warn!("Could not create default status row for {variant}: {e}");
        }
    })
    .await
}

async fn resolve<F, Fut>(
    variant: FormVariant,
    lookup: Result<Option<bool>, Degraded>,
    on_missing: F,
) -> bool
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    match lookup {
        Ok(Some(active)) => active,
        Ok(None) => {
            tracing::debug!("No status row for {variant}, assuming active");
            on_missing().await;
            true
        }
        Err(degraded) => {
            tracing::warn!("Assuming {variant} is active: {degraded}");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn noop() {}

    #[tokio::test]
    async fn missing_row_is_active_for_every_variant() {
        for variant in FormVariant::ALL {
            assert!(resolve(variant, Ok(None), noop).await);
        }
    }

    #[tokio::test]
    async fn degraded_lookup_is_active() {
        let lookup = Err(Degraded {
            reason: "relation \"form_status\" does not exist".into(),
        });
        assert!(resolve(FormVariant::Demo, lookup, noop).await);
    }

    #[tokio::test]
    async fn stored_flag_is_respected() {
        assert!(!resolve(FormVariant::General, Ok(Some(false)), noop).await);
        assert!(resolve(FormVariant::General, Ok(Some(true)), noop).await);
    }

    #[tokio::test]
    async fn default_row_is_only_requested_when_missing() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let bump = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
        };
        resolve(FormVariant::General, Ok(Some(true)), bump).await;
        resolve(FormVariant::General, Ok(None), bump).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
