// ── IP-MAC bindings ──
//
// Enabling is keyed by IP but deploying is keyed by the binding id the
// appliance assigns on add, so the push resolves one into the other
// between those steps.

use std::collections::HashMap;

use tracing::info;

use fwsync_api::{WireId, WireRecord};

use crate::error::CoreError;
use crate::model::{Domain, IpMacPolicy, SingletonConfig};
use crate::normalize::FieldNormalizer;
use crate::repository::{RepositoryError, RuleRepository};

use super::DomainReconciler;
use super::state::{ApplyState, Machine};

const DOMAIN: Domain = Domain::IpMacBinding;

impl<R: RuleRepository> DomainReconciler<'_, R> {
    /// clear+delete(existing) → add → enable(ips) → lookup → deploy(ids),
    /// then the unknown-device action.
    ///
    /// With no local bindings only the clear and the trailing policy
    /// are sent.
    ///
    /// An enabled IP that `lookup` does not resolve fails the enable step
    /// before deploy.
    pub(super) async fn apply_ip_mac(&self) -> Result<(), CoreError> {
        let bindings = self.client.ip_mac();
        let mut machine = Machine::new(DOMAIN, self.device, ApplyState::Start);

        let (records, policy) = machine
            .step(ApplyState::Loaded, async {
                let records = self.repo.list_records(self.device, DOMAIN).await?;
                let policy = self.ip_mac_policy().await?;
                Ok::<_, CoreError>((records, policy))
            })
            .await?;

        let existing = machine
            .step(ApplyState::IdsFetched, bindings.list_ids())
            .await?;

        machine
            .step(ApplyState::Cleared, async {
                if !existing.is_empty() {
                    bindings.clear(policy.clear_action.code()).await?;
                    bindings.delete(&existing).await?;
                }
                Ok::<_, fwsync_api::Error>(())
            })
            .await?;

        if !records.is_empty() {
            let wire: Vec<WireRecord> = records
                .iter()
                .map(|r| FieldNormalizer::to_wire(DOMAIN, r))
                .collect();
            machine
                .step(ApplyState::Added, bindings.add_batch(&wire))
                .await?;

            let ips: Vec<String> = records
                .iter()
                .filter(|r| r.is_enabled())
                .map(|r| r.id.as_str().to_owned())
                .collect();
            machine
                .step(ApplyState::Enabled, async {
                    if ips.is_empty() {
                        return Ok(());
                    }
                    bindings.enable(&ips).await?;
                    let resolved: HashMap<String, WireId> = bindings
                        .lookup(&ips)
                        .await?
                        .into_iter()
                        .map(|b| (b.ip, b.id))
                        .collect();
                    let ids = resolve_binding_ids(&ips, &resolved).map_err(|missing| {
                        CoreError::ApplianceLogic {
                            endpoint: self.client.endpoints().ip_mac.lookup.clone(),
                            code: None,
                            message: format!("no binding id for {}", missing.join(", ")),
                        }
                    })?;
                    bindings.deploy(&ids).await?;
                    Ok::<_, CoreError>(())
                })
                .await?;
        }

        machine
            .step(
                ApplyState::Finalized,
                bindings.set_unknown_device_action(policy.unknown_device_action.code()),
            )
            .await?;

        machine.finish();
        info!(
            device = %self.device,
            domain = %DOMAIN,
            removed = existing.len(),
            pushed = records.len(),
            "applied"
        );
        Ok(())
    }

    /// Stored policy, or pass/alert when none has been saved.
    async fn ip_mac_policy(&self) -> Result<IpMacPolicy, CoreError> {
        match self.repo.get_singleton(self.device, DOMAIN).await {
            Ok(SingletonConfig::IpMacPolicy(policy)) => Ok(policy),
            Ok(other) => Err(CoreError::Internal(format!(
                "{DOMAIN} row holds a {} config",
                other.domain()
            ))),
            Err(RepositoryError::NotFound { .. }) => Ok(IpMacPolicy::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Binding ids for `ips`, in the same order. Every IP must resolve;
/// otherwise the unresolved IPs are returned.
fn resolve_binding_ids(
    ips: &[String],
    resolved: &HashMap<String, WireId>,
) -> Result<Vec<WireId>, Vec<String>> {
    let (ids, missing): (Vec<_>, Vec<_>) = ips
        .iter()
        .map(|ip| resolved.get(ip).cloned().ok_or_else(|| ip.clone()))
        .partition(Result::is_ok);
    if missing.is_empty() {
        Ok(ids.into_iter().flatten().collect())
    } else {
        Err(missing.into_iter().filter_map(Result::err).collect())
    }
}
