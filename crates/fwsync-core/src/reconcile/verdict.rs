// ── Verdict domains: blacklist and learned whitelist ──
//
// The appliance ships a fixed set of signatures and learned entries.
// Nothing is created or deleted; Apply re-labels each entry with its
// desired action, then switches entries on or off. Remote entries with
// no local row are switched off, so the remote enabled set ends up equal
// to the local one.

use std::collections::HashSet;

use strum::IntoEnumIterator;
use tracing::info;

use fwsync_api::{VerdictKind, WireId};

use crate::error::CoreError;
use crate::model::{Domain, RuleAction, RuleRecord};
use crate::repository::RuleRepository;

use super::DomainReconciler;
use super::state::{ApplyState, Machine};

impl<R: RuleRepository> DomainReconciler<'_, R> {
    pub(super) async fn apply_verdicts(
        &self,
        domain: Domain,
        kind: VerdictKind,
    ) -> Result<(), CoreError> {
        let set = self.client.verdict_set(kind);
        let mut machine = Machine::new(domain, self.device, ApplyState::Start);

        let records = machine
            .step(
                ApplyState::Loaded,
                self.repo.list_records(self.device, domain),
            )
            .await?;

        let remote = machine.step(ApplyState::IdsFetched, set.list_ids()).await?;

        // One call per action, in code order, skipping empty groups.
        machine
            .step(ApplyState::Added, async {
                for action in RuleAction::iter() {
                    let ids: Vec<WireId> = records
                        .iter()
                        .filter(|r| r.action == action)
                        .map(|r| r.id.to_wire())
                        .collect();
                    if !ids.is_empty() {
                        set.set_action(&ids, action.code()).await?;
                    }
                }
                Ok::<_, fwsync_api::Error>(())
            })
            .await?;

        let (enabled, disabled) = split_by_status(&records, remote);

        machine
            .step(ApplyState::Enabled, async {
                if !disabled.is_empty() {
                    set.disable(&disabled).await?;
                }
                if !enabled.is_empty() {
                    set.enable(&enabled).await?;
                    if set.deploys() {
                        set.deploy(&enabled).await?;
                    }
                }
                Ok::<_, fwsync_api::Error>(())
            })
            .await?;

        machine.finish();
        info!(
            device = %self.device,
            %domain,
            enabled = enabled.len(),
            disabled = disabled.len(),
            "applied"
        );
        Ok(())
    }
}

/// `(enabled, disabled)` wire ids. Locally disabled rows come first,
/// followed by remote ids that no local row mentions.
fn split_by_status(records: &[RuleRecord], remote: Vec<WireId>) -> (Vec<WireId>, Vec<WireId>) {
    let (enabled, disabled): (Vec<&RuleRecord>, Vec<&RuleRecord>) =
        records.iter().partition(|r| r.is_enabled());
    let enabled: Vec<WireId> = enabled.iter().map(|r| r.id.to_wire()).collect();
    let mut disabled: Vec<WireId> = disabled.iter().map(|r| r.id.to_wire()).collect();

    let known: HashSet<WireId> = enabled.iter().chain(&disabled).cloned().collect();
    let mut seen = HashSet::new();
    disabled.extend(
        remote
            .into_iter()
            .filter(|id| !known.contains(id) && seen.insert(id.clone())),
    );
    (enabled, disabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RuleOwner, RuleStatus};

    fn ids(raw: &[&str]) -> Vec<WireId> {
        raw.iter().map(|id| WireId::from(*id)).collect()
    }

    #[test]
    fn remote_only_entries_are_disabled() {
        let owner = RuleOwner::Device("fw-1".into());
        let records = vec![
            RuleRecord::new("1", owner.clone()),
            RuleRecord::new("2", owner).with_status(RuleStatus::Disabled),
        ];
        let (enabled, disabled) = split_by_status(&records, ids(&["1", "2", "9", "9", "8"]));
        assert_eq!(enabled, ids(&["1"]));
        assert_eq!(disabled, ids(&["2", "9", "8"]));
    }

    #[test]
    fn empty_local_set_disables_everything_remote() {
        let (enabled, disabled) = split_by_status(&[], ids(&["5", "6"]));
        assert!(enabled.is_empty());
        assert_eq!(disabled, ids(&["5", "6"]));
    }
}
