use crate::domain::models::shipment::{Shipment, ShipmentStatus};
use crate::domain::ports::MailTransport;
use std::sync::Arc;
use tera::{Context, Tera};
use tracing::{error, info};

/// Outcome of one dispatch attempt, reported to the caller for
/// observability. A transition never fails because of its notifications.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
    pub skipped: Vec<String>,
}

impl DispatchReport {
    pub fn nothing_sent(&self) -> bool {
        self.sent == 0
    }
}

/// Sends one status message per shipment contact with a usable address.
/// Attempts are isolated: a failure for one contact never blocks the other.
pub struct NotificationDispatcher {
    transport: Arc<dyn MailTransport>,
    templates: Arc<Tera>,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, templates: Arc<Tera>) -> Self {
        Self {
            transport,
            templates,
        }
    }

    pub async fn dispatch(
        &self,
        shipment: &Shipment,
        old_status: ShipmentStatus,
        new_status: ShipmentStatus,
        comment: Option<&str>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        let contacts = [
            ("sender", &shipment.sender_name, &shipment.sender_email),
            (
                "recipient",
                &shipment.recipient_name,
                &shipment.recipient_email,
            ),
        ];

        for (party, name, address) in contacts {
            if !is_valid_email(address) {
                report
                    .skipped
                    .push(format!("{}: no usable address", party));
                continue;
            }

            let (subject, body) =
                match self.render(name, shipment, old_status, new_status, comment) {
                    Ok(rendered) => rendered,
                    Err(e) => {
                        error!("Failed to render notification for {}: {:?}", party, e);
                        report.failed += 1;
                        continue;
                    }
                };

            match self.transport.send(address, &subject, &body).await {
                Ok(()) => {
                    info!(
                        "Status notification sent to {} for {}",
                        party, shipment.tracking_code
                    );
                    report.sent += 1;
                }
                Err(e) => {
                    error!(
                        "Failed to notify {} for {}: {}",
                        party, shipment.tracking_code, e
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    fn render(
        &self,
        contact_name: &str,
        shipment: &Shipment,
        old_status: ShipmentStatus,
        new_status: ShipmentStatus,
        comment: Option<&str>,
    ) -> Result<(String, String), tera::Error> {
        let mut context = Context::new();
        context.insert("contact_name", contact_name);
        context.insert("tracking_code", &shipment.tracking_code);
        context.insert("description", &shipment.description);
        context.insert("old_status", old_status.as_str());
        context.insert("new_status", new_status.as_str());
        context.insert("comment", &comment.unwrap_or(""));

        let subject = self.templates.render("status_update_subject", &context)?;
        let body = self.templates.render("status_update_body", &context)?;
        Ok((subject.trim().to_string(), body))
    }
}

fn is_valid_email(address: &str) -> bool {
    let address = address.trim();
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !address.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid_email("sender@example.com"));
        assert!(is_valid_email("a.b+tag@mail.example.org"));
    }

    #[test]
    fn rejects_blank_and_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("   "));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("us er@example.com"));
    }
}
