// ── Rule-list domains: five-tuple, whitelist, Modbus, S7 ──

use tracing::info;

use fwsync_api::{RuleSetKind, WireRecord};

use crate::error::CoreError;
use crate::model::{Domain, RuleOwner};
use crate::normalize::FieldNormalizer;
use crate::repository::RuleRepository;

use super::state::{ApplyState, Machine, SyncState};
use super::{DomainReconciler, enabled_remote_ids};

impl<R: RuleRepository> DomainReconciler<'_, R> {
    /// disable(existing) → delete(existing) → add(desired) → enable(desired ∩ enabled).
    ///
    /// Disabled desired rules are created but left off. Empty id lists
    /// are never sent.
    pub(super) async fn apply_rule_set(
        &self,
        domain: Domain,
        kind: RuleSetKind,
    ) -> Result<(), CoreError> {
        let rules = self.client.rule_set(kind);
        let mut machine = Machine::new(domain, self.device, ApplyState::Start);

        // Desired state is read before anything remote changes.
        let records = machine
            .step(
                ApplyState::Loaded,
                self.repo.list_records(self.device, domain),
            )
            .await?;
        let wire: Vec<WireRecord> = records
            .iter()
            .map(|r| FieldNormalizer::to_wire(domain, r))
            .collect();

        let existing = machine.step(ApplyState::IdsFetched, rules.list_ids()).await?;

        machine
            .step(ApplyState::Cleared, async {
                if !existing.is_empty() {
                    rules.disable(&existing).await?;
                    rules.delete(&existing).await?;
                }
                Ok::<_, fwsync_api::Error>(())
            })
            .await?;

        let echoed = machine
            .step(ApplyState::Added, async {
                if wire.is_empty() {
                    return Ok(Vec::new());
                }
                rules.add_batch(&wire).await
            })
            .await?;

        let enabled = enabled_remote_ids(&records, echoed);
        machine
            .step(ApplyState::Enabled, async {
                if enabled.is_empty() {
                    return Ok(());
                }
                rules.enable(&enabled).await
            })
            .await?;

        machine.finish();
        info!(
            device = %self.device,
            %domain,
            removed = existing.len(),
            pushed = records.len(),
            enabled = enabled.len(),
            "applied"
        );
        Ok(())
    }

    /// listAll → normalize → replace the stored rows.
    pub(super) async fn sync_rule_set(
        &self,
        domain: Domain,
        kind: RuleSetKind,
    ) -> Result<(), CoreError> {
        let rules = self.client.rule_set(kind);
        let mut machine = Machine::new(domain, self.device, SyncState::Start);

        let rows = machine.step(SyncState::Fetched, rules.list_all()).await?;

        let owner = RuleOwner::Device(self.device.clone());
        let records = machine.advance(
            SyncState::Normalized,
            FieldNormalizer::from_wire_rows(domain, &rows, &owner),
        )?;
        let count = records.len();

        machine
            .step(
                SyncState::Replaced,
                self.repo.replace_all(self.device, domain, records),
            )
            .await?;

        machine.finish();
        info!(device = %self.device, %domain, records = count, "synced");
        Ok(())
    }
}
