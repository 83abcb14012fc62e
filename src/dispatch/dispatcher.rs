//! The panic-dispatch decision core.
//!
//! Given connectivity, location availability, and contact/authority data,
//! `Dispatcher::dispatch` decides between submitting a structured alert to
//! the backend and degrading to device-level fallback actions, and reports
//! one normalized `DispatchOutcome` either way. Collaborators are injected
//! through the `ConnectivityOracle`, `AlertEndpoint`, and `FallbackChannel`
//! traits so the core runs without a network or a device present.

use anyhow::Result;
use tracing::{info, warn};

use crate::api::{PanicPayload, PanicResponse, PayloadContact};
use crate::connectivity::ConnectivityOracle;
use crate::location::LocationFix;
use crate::models::{Authority, Contact};
use crate::offline::FallbackChannel;

// ============================================================================
// Outcome messages
// ============================================================================

const MSG_NO_LOCATION: &str =
    "Location is not available. Please enable location services.";
const MSG_NO_NAME: &str = "Please set your name first.";
const MSG_NO_CONTACTS: &str =
    "You have no emergency contacts. Please add at least one contact.";
const MSG_NO_AUTHORITY: &str = "No emergency authority selected.";
const MSG_REMOTE_FAILED: &str = "Failed to send panic alert. Please try again.";
const MSG_SMS_INITIATED: &str =
    "Emergency SMS initiated. Please complete the sending process.";
const MSG_SMS_FAILED: &str =
    "Failed to send emergency SMS. Please try again or call emergency services directly.";

/// Remote delivery endpoint, implemented by `ApiClient` in production.
#[allow(async_fn_in_trait)]
pub trait AlertEndpoint {
    async fn send_alert(&self, payload: &PanicPayload) -> Result<PanicResponse>;
}

impl AlertEndpoint for crate::api::ApiClient {
    async fn send_alert(&self, payload: &PanicPayload) -> Result<PanicResponse> {
        Ok(self.send_panic(payload).await?)
    }
}

/// Which flow triggered the dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Alert the user's own contact list
    Broadcast,
    /// Alert one built-in emergency authority
    Authority,
}

/// Input to one dispatch attempt; built per panic press and discarded after
/// the outcome is consumed.
#[derive(Debug, Clone)]
pub struct AlertRequest {
    pub requester_name: String,
    pub location: Option<LocationFix>,
    pub recipients: Vec<Contact>,
    pub target_authority: Option<Authority>,
}

/// Which path actually carried (or attempted to carry) the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchChannel {
    Remote,
    Fallback,
}

/// Result of one SMS-compose handoff. `delivered` records only that the
/// compose action was invoked without error, never that a message was sent.
#[derive(Debug, Clone)]
pub struct RecipientResult {
    pub recipient: Contact,
    pub delivered: bool,
}

/// A dial the caller must explicitly confirm before it is placed.
/// Dialing an authority is not undoable the way an abandoned SMS draft is,
/// so the offline authority path stops here instead of auto-dialing.
#[derive(Debug, Clone)]
pub struct PendingCall {
    pub authority: Authority,
}

/// Normalized result of one dispatch attempt. Expected failure modes are
/// reported through this value; `dispatch` never propagates an error.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub succeeded: bool,
    pub message: Option<String>,
    /// None when a precondition failed before any path was selected
    pub channel: Option<DispatchChannel>,
    pub per_recipient: Vec<RecipientResult>,
    pub pending_call: Option<PendingCall>,
}

impl DispatchOutcome {
    fn refused(message: &str) -> Self {
        Self {
            succeeded: false,
            message: Some(message.to_string()),
            channel: None,
            per_recipient: Vec::new(),
            pending_call: None,
        }
    }

    fn remote(succeeded: bool, message: Option<String>) -> Self {
        Self {
            succeeded,
            message,
            channel: Some(DispatchChannel::Remote),
            per_recipient: Vec::new(),
            pending_call: None,
        }
    }

    /// True when the caller must confirm a call before anything happens
    pub fn needs_confirmation(&self) -> bool {
        self.pending_call.is_some()
    }
}

/// Build the fixed offline alert message for a requester and fix
pub fn alert_message(requester_name: &str, location: LocationFix) -> String {
    format!(
        "EMERGENCY ALERT from {}! I need help! My location: {}",
        requester_name,
        location.maps_link()
    )
}

/// The decision core. Holds no state of its own beyond its collaborators
/// and provides no reentrancy guard; the caller serializes dispatches.
pub struct Dispatcher<O, E, F> {
    oracle: O,
    endpoint: E,
    fallback: F,
}

impl<O, E, F> Dispatcher<O, E, F>
where
    O: ConnectivityOracle,
    E: AlertEndpoint,
    F: FallbackChannel,
{
    pub fn new(oracle: O, endpoint: E, fallback: F) -> Self {
        Self {
            oracle,
            endpoint,
            fallback,
        }
    }

    /// Run one dispatch. Preconditions are checked in a fixed order before
    /// any I/O; each failure is terminal and touches no collaborator.
    pub async fn dispatch(&self, request: &AlertRequest, mode: DispatchMode) -> DispatchOutcome {
        let location = match request.location {
            Some(fix) if fix.is_finite() => fix,
            _ => return DispatchOutcome::refused(MSG_NO_LOCATION),
        };
        if request.requester_name.trim().is_empty() {
            return DispatchOutcome::refused(MSG_NO_NAME);
        }
        let authority = match mode {
            DispatchMode::Broadcast => {
                if request.recipients.is_empty() {
                    return DispatchOutcome::refused(MSG_NO_CONTACTS);
                }
                None
            }
            DispatchMode::Authority => match request.target_authority.clone() {
                Some(authority) => Some(authority),
                None => return DispatchOutcome::refused(MSG_NO_AUTHORITY),
            },
        };

        // The flag is read here, at the instant of dispatch; a value cached
        // from an earlier render could be stale.
        if self.oracle.is_reachable() {
            self.dispatch_remote(request, location, authority.as_ref())
                .await
        } else {
            match authority {
                None => self.dispatch_sms_fanout(request, location).await,
                Some(authority) => {
                    info!(authority = %authority.name, "Offline - direct call requires confirmation");
                    DispatchOutcome {
                        succeeded: false,
                        message: Some(format!(
                            "You are offline. Confirm to call {} directly.",
                            authority.name
                        )),
                        channel: Some(DispatchChannel::Fallback),
                        per_recipient: Vec::new(),
                        pending_call: Some(PendingCall { authority }),
                    }
                }
            }
        }
    }

    /// Place a call the user has explicitly confirmed.
    pub async fn confirm_call(&self, pending: &PendingCall) -> bool {
        info!(authority = %pending.authority.name, "Placing confirmed call");
        self.fallback.dial(&pending.authority.phone_number).await
    }

    async fn dispatch_remote(
        &self,
        request: &AlertRequest,
        location: LocationFix,
        authority: Option<&Authority>,
    ) -> DispatchOutcome {
        let payload = build_payload(request, location, authority);

        // A transport failure here does not fail over to the offline path:
        // the server may already have processed part of the request, and a
        // second delivery attempt could double-send.
        match self.endpoint.send_alert(&payload).await {
            Ok(response) if response.success => {
                info!("Panic alert submitted");
                DispatchOutcome::remote(true, response.message)
            }
            Ok(response) => {
                warn!(message = ?response.message, "Backend rejected panic alert");
                let message = response
                    .message
                    .unwrap_or_else(|| MSG_REMOTE_FAILED.to_string());
                DispatchOutcome::remote(false, Some(message))
            }
            Err(e) => {
                warn!(error = %e, "Panic alert submission failed");
                DispatchOutcome::remote(false, Some(MSG_REMOTE_FAILED.to_string()))
            }
        }
    }

    async fn dispatch_sms_fanout(
        &self,
        request: &AlertRequest,
        location: LocationFix,
    ) -> DispatchOutcome {
        let message = alert_message(&request.requester_name, location);

        // Strictly sequential: each compose hands a UI surface to the OS,
        // and stacking them concurrently would bury earlier drafts.
        // Duplicate numbers are not deduplicated; each compose is a draft,
        // not an auto-send.
        let mut per_recipient = Vec::with_capacity(request.recipients.len());
        for recipient in &request.recipients {
            let delivered = self
                .fallback
                .compose_sms(&recipient.phone_number, &message)
                .await;
            if !delivered {
                warn!(contact = %recipient.name, "SMS compose handoff failed");
            }
            per_recipient.push(RecipientResult {
                recipient: recipient.clone(),
                delivered,
            });
        }

        // At-least-one semantics: a single reachable composer is enough to
        // count the batch as initiated.
        let succeeded = per_recipient.iter().any(|r| r.delivered);
        let message = if succeeded {
            MSG_SMS_INITIATED
        } else {
            MSG_SMS_FAILED
        };

        DispatchOutcome {
            succeeded,
            message: Some(message.to_string()),
            channel: Some(DispatchChannel::Fallback),
            per_recipient,
            pending_call: None,
        }
    }
}

/// Assemble the wire payload for the remote path.
///
/// Authority mode sends the entire authority catalog as `contacts`
/// alongside `authorityType`, mirroring the backend contract: the server
/// routes to the selected authority but receives every authority's contact
/// info with the request.
fn build_payload(
    request: &AlertRequest,
    location: LocationFix,
    authority: Option<&Authority>,
) -> PanicPayload {
    let (contacts, authority_type) = match authority {
        Some(authority) => {
            let catalog = Authority::catalog()
                .into_iter()
                .map(|a| PayloadContact {
                    name: a.name,
                    phone_number: a.phone_number,
                    email: a.email,
                })
                .collect();
            (Some(catalog), Some(authority.kind))
        }
        None => {
            let recipients = request
                .recipients
                .iter()
                .map(|c| PayloadContact {
                    name: c.name.clone(),
                    phone_number: c.phone_number.clone(),
                    email: c.email.clone(),
                })
                .collect();
            (Some(recipients), None)
        }
    };

    PanicPayload {
        name: request.requester_name.clone(),
        location,
        contacts,
        authority_type,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorityKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct StaticOracle(bool);

    impl ConnectivityOracle for StaticOracle {
        fn is_reachable(&self) -> bool {
            self.0
        }
    }

    #[derive(Clone)]
    enum EndpointBehavior {
        Succeed,
        RejectWith(Option<&'static str>),
        TransportError,
    }

    #[derive(Clone)]
    struct MockEndpoint {
        behavior: EndpointBehavior,
        calls: Arc<AtomicUsize>,
        last_payload: Arc<Mutex<Option<PanicPayload>>>,
    }

    impl MockEndpoint {
        fn new(behavior: EndpointBehavior) -> Self {
            Self {
                behavior,
                calls: Arc::new(AtomicUsize::new(0)),
                last_payload: Arc::new(Mutex::new(None)),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_payload(&self) -> Option<PanicPayload> {
            self.last_payload.lock().expect("payload lock").clone()
        }
    }

    impl AlertEndpoint for MockEndpoint {
        async fn send_alert(&self, payload: &PanicPayload) -> Result<PanicResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_payload.lock().expect("payload lock") = Some(payload.clone());
            match self.behavior {
                EndpointBehavior::Succeed => Ok(PanicResponse {
                    success: true,
                    message: None,
                    data: None,
                    count: Some(1),
                }),
                EndpointBehavior::RejectWith(message) => Ok(PanicResponse {
                    success: false,
                    message: message.map(str::to_string),
                    data: None,
                    count: None,
                }),
                EndpointBehavior::TransportError => {
                    Err(anyhow::anyhow!("connection reset by peer"))
                }
            }
        }
    }

    #[derive(Clone, Default)]
    struct MockFallback {
        sms_results: Arc<Mutex<Vec<bool>>>,
        sms_calls: Arc<Mutex<Vec<String>>>,
        dial_calls: Arc<Mutex<Vec<String>>>,
        dial_ok: bool,
    }

    impl MockFallback {
        fn with_sms_results(results: &[bool]) -> Self {
            Self {
                sms_results: Arc::new(Mutex::new(results.to_vec())),
                dial_ok: true,
                ..Default::default()
            }
        }

        fn sms_calls(&self) -> Vec<String> {
            self.sms_calls.lock().expect("sms lock").clone()
        }

        fn dial_calls(&self) -> Vec<String> {
            self.dial_calls.lock().expect("dial lock").clone()
        }
    }

    impl FallbackChannel for MockFallback {
        async fn compose_sms(&self, phone_number: &str, _message: &str) -> bool {
            self.sms_calls
                .lock()
                .expect("sms lock")
                .push(phone_number.to_string());
            let mut results = self.sms_results.lock().expect("results lock");
            if results.is_empty() {
                true
            } else {
                results.remove(0)
            }
        }

        async fn dial(&self, phone_number: &str) -> bool {
            self.dial_calls
                .lock()
                .expect("dial lock")
                .push(phone_number.to_string());
            self.dial_ok
        }
    }

    fn contact(name: &str, phone: &str) -> Contact {
        Contact {
            id: format!("id-{}", phone),
            name: name.to_string(),
            phone_number: phone.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn valid_request() -> AlertRequest {
        AlertRequest {
            requester_name: "Ada".to_string(),
            location: Some(LocationFix {
                latitude: 6.5244,
                longitude: 3.3792,
            }),
            recipients: vec![
                contact("Grace", "08011111111"),
                contact("Linus", "08022222222"),
                contact("Marie", "08033333333"),
            ],
            target_authority: Some(Authority::for_kind(AuthorityKind::Police)),
        }
    }

    fn dispatcher(
        reachable: bool,
        endpoint: MockEndpoint,
        fallback: MockFallback,
    ) -> Dispatcher<StaticOracle, MockEndpoint, MockFallback> {
        Dispatcher::new(StaticOracle(reachable), endpoint, fallback)
    }

    #[tokio::test]
    async fn test_missing_location_refused_without_io() {
        let endpoint = MockEndpoint::new(EndpointBehavior::Succeed);
        let fallback = MockFallback::with_sms_results(&[]);
        let d = dispatcher(true, endpoint.clone(), fallback.clone());

        let mut request = valid_request();
        request.location = None;
        let outcome = d.dispatch(&request, DispatchMode::Broadcast).await;

        assert!(!outcome.succeeded);
        assert!(outcome.channel.is_none());
        assert_eq!(outcome.message.as_deref(), Some(MSG_NO_LOCATION));
        assert_eq!(endpoint.call_count(), 0);
        assert!(fallback.sms_calls().is_empty());
        assert!(fallback.dial_calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_finite_location_treated_as_missing() {
        let endpoint = MockEndpoint::new(EndpointBehavior::Succeed);
        let d = dispatcher(true, endpoint.clone(), MockFallback::with_sms_results(&[]));

        let mut request = valid_request();
        request.location = Some(LocationFix {
            latitude: f64::NAN,
            longitude: 3.0,
        });
        let outcome = d.dispatch(&request, DispatchMode::Broadcast).await;

        assert!(!outcome.succeeded);
        assert_eq!(endpoint.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_name_refused_without_io() {
        let endpoint = MockEndpoint::new(EndpointBehavior::Succeed);
        let fallback = MockFallback::with_sms_results(&[]);
        let d = dispatcher(true, endpoint.clone(), fallback.clone());

        let mut request = valid_request();
        request.requester_name = "   ".to_string();
        let outcome = d.dispatch(&request, DispatchMode::Broadcast).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.message.as_deref(), Some(MSG_NO_NAME));
        assert_eq!(endpoint.call_count(), 0);
        assert!(fallback.sms_calls().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_without_recipients_refused() {
        let endpoint = MockEndpoint::new(EndpointBehavior::Succeed);
        let d = dispatcher(true, endpoint.clone(), MockFallback::with_sms_results(&[]));

        let mut request = valid_request();
        request.recipients.clear();
        let outcome = d.dispatch(&request, DispatchMode::Broadcast).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.message.as_deref(), Some(MSG_NO_CONTACTS));
        assert_eq!(endpoint.call_count(), 0);
    }

    #[tokio::test]
    async fn test_authority_mode_without_selection_refused() {
        let endpoint = MockEndpoint::new(EndpointBehavior::Succeed);
        let d = dispatcher(true, endpoint.clone(), MockFallback::with_sms_results(&[]));

        let mut request = valid_request();
        request.target_authority = None;
        let outcome = d.dispatch(&request, DispatchMode::Authority).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.message.as_deref(), Some(MSG_NO_AUTHORITY));
        assert_eq!(endpoint.call_count(), 0);
    }

    #[tokio::test]
    async fn test_online_broadcast_success() {
        let endpoint = MockEndpoint::new(EndpointBehavior::Succeed);
        let fallback = MockFallback::with_sms_results(&[]);
        let d = dispatcher(true, endpoint.clone(), fallback.clone());

        let outcome = d.dispatch(&valid_request(), DispatchMode::Broadcast).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.channel, Some(DispatchChannel::Remote));
        assert_eq!(endpoint.call_count(), 1);
        assert!(fallback.sms_calls().is_empty());

        let payload = endpoint.last_payload().expect("payload captured");
        assert_eq!(payload.name, "Ada");
        assert!(payload.authority_type.is_none());
        let contacts = payload.contacts.expect("contacts present");
        assert_eq!(contacts.len(), 3);
        assert_eq!(contacts[0].phone_number, "08011111111");
    }

    #[tokio::test]
    async fn test_online_rejection_passes_server_message() {
        let endpoint = MockEndpoint::new(EndpointBehavior::RejectWith(Some("rate limited")));
        let d = dispatcher(true, endpoint.clone(), MockFallback::with_sms_results(&[]));

        let outcome = d.dispatch(&valid_request(), DispatchMode::Broadcast).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.channel, Some(DispatchChannel::Remote));
        assert_eq!(outcome.message.as_deref(), Some("rate limited"));
    }

    #[tokio::test]
    async fn test_online_rejection_without_message_uses_generic() {
        let endpoint = MockEndpoint::new(EndpointBehavior::RejectWith(None));
        let d = dispatcher(true, endpoint.clone(), MockFallback::with_sms_results(&[]));

        let outcome = d.dispatch(&valid_request(), DispatchMode::Broadcast).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.message.as_deref(), Some(MSG_REMOTE_FAILED));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_fail_over() {
        let endpoint = MockEndpoint::new(EndpointBehavior::TransportError);
        let fallback = MockFallback::with_sms_results(&[true, true, true]);
        let d = dispatcher(true, endpoint.clone(), fallback.clone());

        let outcome = d.dispatch(&valid_request(), DispatchMode::Broadcast).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.channel, Some(DispatchChannel::Remote));
        assert_eq!(outcome.message.as_deref(), Some(MSG_REMOTE_FAILED));
        // The offline path must not run after a transport failure
        assert!(fallback.sms_calls().is_empty());
        assert!(fallback.dial_calls().is_empty());
    }

    #[tokio::test]
    async fn test_offline_broadcast_partial_success() {
        let endpoint = MockEndpoint::new(EndpointBehavior::Succeed);
        let fallback = MockFallback::with_sms_results(&[true, false, true]);
        let d = dispatcher(false, endpoint.clone(), fallback.clone());

        let outcome = d.dispatch(&valid_request(), DispatchMode::Broadcast).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.channel, Some(DispatchChannel::Fallback));
        assert_eq!(outcome.message.as_deref(), Some(MSG_SMS_INITIATED));
        assert_eq!(endpoint.call_count(), 0);

        let delivered: Vec<bool> = outcome.per_recipient.iter().map(|r| r.delivered).collect();
        assert_eq!(delivered, vec![true, false, true]);
        // Fan-out order follows the recipient list
        assert_eq!(
            fallback.sms_calls(),
            vec!["08011111111", "08022222222", "08033333333"]
        );
    }

    #[tokio::test]
    async fn test_offline_broadcast_all_failed() {
        let fallback = MockFallback::with_sms_results(&[false, false, false]);
        let d = dispatcher(
            false,
            MockEndpoint::new(EndpointBehavior::Succeed),
            fallback.clone(),
        );

        let outcome = d.dispatch(&valid_request(), DispatchMode::Broadcast).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.message.as_deref(), Some(MSG_SMS_FAILED));
        assert_eq!(outcome.per_recipient.len(), 3);
    }

    #[tokio::test]
    async fn test_offline_broadcast_keeps_duplicate_numbers() {
        let fallback = MockFallback::with_sms_results(&[true, true]);
        let d = dispatcher(
            false,
            MockEndpoint::new(EndpointBehavior::Succeed),
            fallback.clone(),
        );

        let mut request = valid_request();
        request.recipients = vec![contact("Grace", "08011111111"), contact("Gram", "08011111111")];
        let outcome = d.dispatch(&request, DispatchMode::Broadcast).await;

        assert!(outcome.succeeded);
        assert_eq!(fallback.sms_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_offline_authority_requires_confirmation() {
        let fallback = MockFallback::with_sms_results(&[]);
        let d = dispatcher(
            false,
            MockEndpoint::new(EndpointBehavior::Succeed),
            fallback.clone(),
        );

        let outcome = d.dispatch(&valid_request(), DispatchMode::Authority).await;

        assert!(outcome.needs_confirmation());
        assert!(!outcome.succeeded);
        assert_eq!(outcome.channel, Some(DispatchChannel::Fallback));
        // No dial until the caller confirms
        assert!(fallback.dial_calls().is_empty());

        let pending = outcome.pending_call.expect("pending call");
        assert!(d.confirm_call(&pending).await);
        assert_eq!(fallback.dial_calls(), vec!["08109251030"]);
    }

    #[tokio::test]
    async fn test_online_authority_sends_catalog_and_type() {
        let endpoint = MockEndpoint::new(EndpointBehavior::Succeed);
        let d = dispatcher(true, endpoint.clone(), MockFallback::with_sms_results(&[]));

        let outcome = d.dispatch(&valid_request(), DispatchMode::Authority).await;

        assert!(outcome.succeeded);
        let payload = endpoint.last_payload().expect("payload captured");
        assert_eq!(payload.authority_type, Some(AuthorityKind::Police));
        // The whole catalog rides along as contacts, not just the target
        let contacts = payload.contacts.expect("contacts present");
        assert_eq!(contacts.len(), Authority::catalog().len());
    }

    #[tokio::test]
    async fn test_repeat_dispatch_is_not_deduplicated() {
        let endpoint = MockEndpoint::new(EndpointBehavior::Succeed);
        let d = dispatcher(true, endpoint.clone(), MockFallback::with_sms_results(&[]));

        let request = valid_request();
        let first = d.dispatch(&request, DispatchMode::Broadcast).await;
        let second = d.dispatch(&request, DispatchMode::Broadcast).await;

        assert!(first.succeeded && second.succeeded);
        assert_eq!(endpoint.call_count(), 2);
    }

    #[test]
    fn test_alert_message_template() {
        let fix = LocationFix {
            latitude: 6.5244,
            longitude: 3.3792,
        };
        assert_eq!(
            alert_message("Ada", fix),
            "EMERGENCY ALERT from Ada! I need help! My location: https://maps.google.com/?q=6.5244,3.3792"
        );
    }
}
