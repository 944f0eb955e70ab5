//! API client port — read-only platform lookups for evaluation context.

use std::future::Future;

use rulehub_domain::context::{OrganizationInfo, RepositoryInfo, UserInfo};
use rulehub_domain::error::RuleHubError;

/// Read-only lookups against the hosting platform.
///
/// Results feed the [`EvaluationContext`](rulehub_domain::context::EvaluationContext);
/// a failed lookup leaves its slot empty rather than failing evaluation.
pub trait ApiClient {
    /// Fetch repository attributes.
    fn get_repository(
        &self,
        organization: &str,
        name: &str,
    ) -> impl Future<Output = Result<RepositoryInfo, RuleHubError>> + Send;

    /// Fetch organization attributes.
    fn get_organization(
        &self,
        login: &str,
    ) -> impl Future<Output = Result<OrganizationInfo, RuleHubError>> + Send;

    /// Fetch user attributes.
    fn get_user(&self, login: &str)
    -> impl Future<Output = Result<UserInfo, RuleHubError>> + Send;
}
