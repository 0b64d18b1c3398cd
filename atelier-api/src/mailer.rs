/// Outbound mail notifications
///
/// Password resets, inquiry alerts, and application alerts go through
/// this one surface. Delivery is currently a structured log line; the
/// site's mail relay picks messages up from the log shipper, so handlers
/// only ever call fire-and-forget methods that cannot fail a request.

use tracing::info;

use crate::config::SiteConfig;

#[derive(Debug, Clone)]
pub struct Mailer {
    site_url: String,
    admin_email: Option<String>,
}

impl Mailer {
    pub fn new(site: &SiteConfig) -> Self {
        Self {
            site_url: site.url.clone(),
            admin_email: site.admin_email.clone(),
        }
    }

    /// Sends the password reset link to the account email.
    pub fn send_password_reset(&self, recipient: &str, token: &str) {
        let link = format!("{}/admin/reset-password?token={}", self.site_url, token);
        info!(
            mail = "password_reset",
            recipient,
            link = %link,
            "Password reset mail queued"
        );
    }

    /// Alerts the admin inbox about a new inquiry.
    pub fn notify_inquiry(&self, name: &str, email: &str) {
        info!(
            mail = "inquiry",
            recipient = self.admin_email.as_deref().unwrap_or("unset"),
            from_name = name,
            from_email = email,
            "Inquiry notification queued"
        );
    }

    /// Alerts the admin inbox about a new job application.
    pub fn notify_application(&self, name: &str, email: &str, job_id: &str) {
        info!(
            mail = "application",
            recipient = self.admin_email.as_deref().unwrap_or("unset"),
            from_name = name,
            from_email = email,
            job_id,
            "Application notification queued"
        );
    }
}
