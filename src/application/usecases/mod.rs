pub mod profile_provisioner;
pub mod subscriptions;
