// Appliance system endpoints
//
// Whole-device operations used by fleet batches.

use tracing::debug;

use crate::client::ApplianceClient;
use crate::error::Error;
use crate::session::CheckMode;

impl ApplianceClient {
    /// Reboot the appliance.
    ///
    /// `POST system/reboot` — `SuccessCheck`.
    pub async fn reboot(&self) -> Result<(), Error> {
        debug!("rebooting appliance");
        self.session
            .post_json(&self.endpoints.reboot, &serde_json::json!({}), CheckMode::Success)
            .await?;
        Ok(())
    }

    /// Detach the appliance from central management.
    ///
    /// `POST system/unregister` — `SuccessCheck`.
    pub async fn unregister(&self) -> Result<(), Error> {
        debug!("unregistering appliance");
        self.session
            .post_json(
                &self.endpoints.unregister,
                &serde_json::json!({}),
                CheckMode::Success,
            )
            .await?;
        Ok(())
    }
}
