use std::sync::Arc;

use tracing::{info, warn};

use crate::application::gateway::PaymentGateway;
use crate::domain::value_objects::payments::{
    BillingAddress, CardDetails, ClassifiedError, GatewayErrorKind, ProfileReference,
};

/// Obtains a reusable customer profile for a freshly captured charge with the
/// fewest remote calls: derive it from the transaction record, and fall back
/// to explicit creation with the same payment details when that fails.
///
/// Existing customers with a stored profile bypass this component entirely.
pub struct ProfileProvisioner<G>
where
    G: PaymentGateway + Send + Sync + 'static,
{
    gateway: Arc<G>,
}

impl<G> ProfileProvisioner<G>
where
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn provision(
        &self,
        transaction_id: &str,
        customer_name: &str,
        email: &str,
        billing_address: Option<&BillingAddress>,
        card: &CardDetails,
    ) -> Result<ProfileReference, ClassifiedError> {
        match self.gateway.derive_profile_from_transaction(transaction_id).await {
            Ok(profile) if profile.is_complete() => {
                info!(
                    transaction_id,
                    customer_profile_id = %profile.customer_profile_id,
                    "provisioning: profile derived from transaction"
                );
                return Ok(profile);
            }
            Ok(profile) => {
                warn!(
                    transaction_id,
                    customer_profile_id = %profile.customer_profile_id,
                    payment_profile_present = !profile.payment_profile_id.is_empty(),
                    address_present = !profile.address_id.is_empty(),
                    "provisioning: derived profile is missing identifiers; creating one explicitly"
                );
            }
            Err(err) => {
                warn!(
                    transaction_id,
                    error = %err,
                    "provisioning: could not derive profile from transaction; creating one explicitly"
                );
            }
        }

        self.create_explicitly(transaction_id, customer_name, email, billing_address, card)
            .await
    }

    async fn create_explicitly(
        &self,
        transaction_id: &str,
        customer_name: &str,
        email: &str,
        billing_address: Option<&BillingAddress>,
        card: &CardDetails,
    ) -> Result<ProfileReference, ClassifiedError> {
        let created = self
            .gateway
            .create_profile_explicitly(
                transaction_id,
                email,
                card,
                billing_address.cloned(),
                billing_address.cloned(),
            )
            .await
            .map_err(|err| err.into_classified())?;

        if !created.is_complete() {
            warn!(
                transaction_id,
                customer_name,
                customer_profile_id = %created.customer_profile_id,
                "provisioning: explicitly created profile is still missing identifiers"
            );
            return Err(ClassifiedError {
                code: None,
                kind: GatewayErrorKind::Unknown,
                user_message:
                    "We could not store your payment details for future billing. Please contact support."
                        .to_string(),
                technical_details: format!(
                    "explicit profile creation returned an incomplete identifier triple \
                     (customer={}, payment={}, address={})",
                    created.customer_profile_id, created.payment_profile_id, created.address_id
                ),
                retryable: false,
                retry_delay_ms: 0,
            });
        }

        info!(
            transaction_id,
            customer_profile_id = %created.customer_profile_id,
            "provisioning: profile created explicitly"
        );
        Ok(created)
    }
}
