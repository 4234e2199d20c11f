// ── Singleton domains: connection, protocol default, OPC ──

use tracing::info;

use crate::error::CoreError;
use crate::model::{
    ConnectionMode, ConnectionSettings, Domain, OpcMode, OpcSettings, ProtocolDefaults, RuleAction,
    SingletonConfig,
};
use crate::repository::RuleRepository;

use super::DomainReconciler;
use super::state::{ApplyState, Machine, SyncState};

impl<R: RuleRepository> DomainReconciler<'_, R> {
    /// Write the stored row's fields in their fixed order. A missing row
    /// fails this domain with `NotFound`.
    pub(super) async fn apply_singleton(&self, domain: Domain) -> Result<(), CoreError> {
        let mut machine = Machine::new(domain, self.device, ApplyState::Start);

        let config = machine
            .step(
                ApplyState::Loaded,
                self.repo.get_singleton(self.device, domain),
            )
            .await?;

        machine
            .step(ApplyState::Written, async {
                match (domain, config) {
                    (Domain::ConnectionConfig, SingletonConfig::Connection(c)) => {
                        self.client
                            .set_connection_mode(c.connection_mode.code())
                            .await?;
                        self.client.set_default_action(c.default_action.code()).await?;
                    }
                    (Domain::ProtocolDefaultConfig, SingletonConfig::ProtocolDefault(p)) => {
                        self.client
                            .set_protocol_default_action(p.dpi_default_action.code())
                            .await?;
                    }
                    (Domain::OpcReadWrite, SingletonConfig::Opc(o)) => {
                        self.client.set_opc_mode(o.mode.code()).await?;
                    }
                    (_, other) => return Err(mismatched(domain, &other)),
                }
                Ok::<(), CoreError>(())
            })
            .await?;

        machine.finish();
        info!(device = %self.device, %domain, ?config, "applied");
        Ok(())
    }

    /// Read the settings back and store them as the domain's one row.
    pub(super) async fn sync_singleton(&self, domain: Domain) -> Result<(), CoreError> {
        let mut machine = Machine::new(domain, self.device, SyncState::Start);

        let codes = machine
            .step(SyncState::Fetched, async {
                let codes = match domain {
                    Domain::ConnectionConfig => vec![
                        self.client.connection_mode().await?,
                        self.client.default_action().await?,
                    ],
                    Domain::ProtocolDefaultConfig => {
                        vec![self.client.protocol_default_action().await?]
                    }
                    Domain::OpcReadWrite => vec![self.client.opc_mode().await?],
                    _ => return Err(super::unsupported_sync(domain)),
                };
                Ok::<_, CoreError>(codes)
            })
            .await?;

        let config = machine.advance(SyncState::Normalized, decode(domain, &codes))?;

        machine
            .step(
                SyncState::Replaced,
                self.repo.put_singleton(self.device, config),
            )
            .await?;

        machine.finish();
        info!(device = %self.device, %domain, ?config, "synced");
        Ok(())
    }
}

fn mismatched(domain: Domain, config: &SingletonConfig) -> CoreError {
    CoreError::Internal(format!(
        "{domain} row holds a {} config",
        config.domain()
    ))
}

/// Turn the codes read for `domain` into its stored row.
fn decode(domain: Domain, codes: &[i64]) -> Result<SingletonConfig, CoreError> {
    let bad = |what: &str, code: i64| CoreError::Normalization {
        domain,
        message: format!("unknown {what} code {code}"),
    };
    let action = |code: i64| RuleAction::from_code(code).ok_or_else(|| bad("action", code));

    match (domain, codes) {
        (Domain::ConnectionConfig, &[mode, default_action]) => {
            Ok(SingletonConfig::Connection(ConnectionSettings {
                connection_mode: ConnectionMode::from_code(mode)
                    .ok_or_else(|| bad("connection mode", mode))?,
                default_action: action(default_action)?,
            }))
        }
        (Domain::ProtocolDefaultConfig, &[dpi]) => {
            Ok(SingletonConfig::ProtocolDefault(ProtocolDefaults {
                dpi_default_action: action(dpi)?,
            }))
        }
        (Domain::OpcReadWrite, &[mode]) => Ok(SingletonConfig::Opc(OpcSettings {
            mode: OpcMode::from_code(mode).ok_or_else(|| bad("opc mode", mode))?,
        })),
        _ => Err(CoreError::Internal(format!(
            "{domain}: unexpected setting count {}",
            codes.len()
        ))),
    }
}
