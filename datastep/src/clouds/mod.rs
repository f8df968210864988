//! Clients for the cloud storage services backing our datastores.

pub(crate) mod aws;
pub(crate) mod gcloud;
