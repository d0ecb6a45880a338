//! Calendar account reader port (read side).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TenantId};
use crate::domain::plan::CalendarAccount;

/// Read port for tenant calendar accounts.
///
/// Account setup and credential management happen outside this engine;
/// the engine only needs to look up the connection per tenant.
#[async_trait]
pub trait CalendarAccountReader: Send + Sync {
    /// Find the calendar account of a tenant.
    ///
    /// Returns `None` when the tenant never configured one.
    async fn find_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<CalendarAccount>, DomainError>;
}
