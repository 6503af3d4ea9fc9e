use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use padron_core::error::DomainError;
use padron_core::events::{CredentialsIssued, DomainEvent};
use padron_core::ids::RegistrationId;
use padron_core::registrant::{MaskedPhone, NationalId, PhoneNumber, RegistrantIdentity};
use padron_core::registration::Registration;
use padron_core::verification::{OtpCode, OtpSession, SessionStatus};
use padron_ports::error::FlowError;
use padron_ports::inbound::{CredentialRecovery, EnrollmentFlow};
use padron_ports::outbound::{EventPublisher, RegistrationRepository, VerificationGateway};
use padron_ports::types::{
    CodeCheck, CodeDispatch, CredentialIssue, RawEnrollment, VerificationPhase,
};

/// Field-level checks only; nothing here touches the network.
pub fn validate_identity(enrollment: &RawEnrollment) -> Result<RegistrantIdentity, FlowError> {
    let national_id = NationalId::new(&enrollment.national_id)?;
    Ok(RegistrantIdentity::new(
        &enrollment.name,
        &enrollment.surname,
        national_id,
    )?)
}

/// In-memory state of one verification attempt. The attempt counter is
/// bumped whenever the current session is discarded or replaced, so a
/// gateway response that comes back for an abandoned attempt can be told
/// apart and dropped.
#[derive(Default)]
struct FlowState {
    session: Option<OtpSession>,
    attempt: u64,
    sending: bool,
    confirming: bool,
}

/// Drives one registrant through code dispatch, confirmation and
/// credential issuance. Scoped to a single attempt; collaborators are
/// injected at construction.
///
/// Lock discipline: the state mutex is never held across an await.
pub struct VerificationService<G, R, EP>
where
    G: VerificationGateway,
    R: RegistrationRepository,
    EP: EventPublisher,
{
    gateway: G,
    registrations: R,
    events: EP,
    state: Mutex<FlowState>,
}

impl<G, R, EP> VerificationService<G, R, EP>
where
    G: VerificationGateway,
    R: RegistrationRepository,
    EP: EventPublisher,
{
    pub fn new(gateway: G, registrations: R, events: EP) -> Self {
        Self {
            gateway,
            registrations,
            events,
            state: Mutex::new(FlowState::default()),
        }
    }

    /// Dispatch a code for a fresh enrollment. Re-invoking while a code is
    /// still pending performs no second dispatch and returns the same
    /// masked phone.
    pub async fn request_code(
        &self,
        enrollment: RawEnrollment,
        now: DateTime<Utc>,
    ) -> Result<MaskedPhone, FlowError> {
        let registrant = validate_identity(&enrollment)?;
        let phone = PhoneNumber::new(
            &enrollment.country_code,
            &enrollment.area_code,
            &enrollment.subscriber_number,
        )?;
        self.start_session(registrant, phone, now).await
    }

    /// Dispatch a code to the phone already on file for a registered
    /// national id, for credential re-delivery.
    pub async fn begin_identity_check(
        &self,
        national_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MaskedPhone, FlowError> {
        let national_id = NationalId::new(national_id)?;
        let registration = self
            .registrations
            .find_by_national_id(national_id.as_str())
            .await?
            .ok_or(FlowError::NotRegistered)?;
        self.start_session(
            registration.registrant().clone(),
            registration.phone().clone(),
            now,
        )
        .await
    }

    async fn start_session(
        &self,
        registrant: RegistrantIdentity,
        phone: PhoneNumber,
        now: DateTime<Utc>,
    ) -> Result<MaskedPhone, FlowError> {
        let (attempt, expire_events) = {
            let mut guard = self.state.lock().unwrap();
            let st = &mut *guard;
            if st.sending {
                return Err(FlowError::Busy);
            }
            let mut expire_events = Vec::new();
            if let Some(session) = st.session.as_mut() {
                expire_events = session.expire_if_due(now);
                let status = session.status();
                let masked = session.phone().masked();
                match status {
                    SessionStatus::Pending => return Ok(masked),
                    SessionStatus::Confirmed => {
                        return Err(DomainError::SessionAlreadyConfirmed.into())
                    }
                    // lapsed attempt: discard and start over
                    SessionStatus::Expired => st.session = None,
                }
            }
            st.sending = true;
            st.attempt += 1;
            (st.attempt, expire_events)
        };

        if !expire_events.is_empty() {
            self.events.publish(expire_events).await?;
        }

        let dispatch = CodeDispatch {
            name: registrant.name().to_string(),
            surname: registrant.surname().to_string(),
            national_id: registrant.national_id().to_string(),
            messaging_phone: phone.messaging(),
        };
        let sent = self.gateway.send_code(&dispatch).await;

        let (masked, events) = {
            let mut guard = self.state.lock().unwrap();
            let st = &mut *guard;
            st.sending = false;
            if let Err(e) = sent {
                return Err(FlowError::Dispatch(e.to_string()));
            }
            if st.attempt != attempt {
                // the attempt was reset while the dispatch was in flight
                return Err(FlowError::Superseded);
            }
            let (session, events) = OtpSession::start(registrant, phone, now);
            let masked = session.phone().masked();
            st.session = Some(session);
            (masked, events)
        };

        self.events.publish(events).await?;
        Ok(masked)
    }

    /// Check the entered code against the collaborator, then have
    /// credentials issued. The session becomes `Confirmed` only when both
    /// calls succeed; an issuance failure leaves it `Pending` so the
    /// registrant can retry without requesting a new code.
    pub async fn confirm_code(&self, code: &str, now: DateTime<Utc>) -> Result<(), FlowError> {
        let code = OtpCode::new(code)?;

        let gate = {
            let mut guard = self.state.lock().unwrap();
            let st = &mut *guard;
            if st.confirming {
                return Err(FlowError::Busy);
            }
            let session = st.session.as_mut().ok_or(FlowError::NoActiveSession)?;
            let expire_events = session.expire_if_due(now);
            match session.status() {
                SessionStatus::Expired => Err(expire_events),
                SessionStatus::Confirmed => return Ok(()),
                SessionStatus::Pending => {
                    st.confirming = true;
                    let national_id = session.registrant().national_id().to_string();
                    let dispatch_phone = session.phone().dispatch();
                    Ok((
                        st.attempt,
                        CodeCheck {
                            national_id: national_id.clone(),
                            dispatch_phone: dispatch_phone.clone(),
                            code: code.as_str().to_string(),
                        },
                        CredentialIssue {
                            national_id,
                            dispatch_phone,
                        },
                    ))
                }
            }
        };
        let (attempt, check, issue) = match gate {
            // lapsed before the collaborator was ever reached
            Err(expire_events) => {
                self.events.publish(expire_events).await?;
                return Err(FlowError::Expired);
            }
            Ok(parts) => parts,
        };

        if let Err(e) = self.gateway.confirm_code(&check).await {
            self.state.lock().unwrap().confirming = false;
            return Err(FlowError::Confirmation(e.to_string()));
        }

        let receipt = match self.gateway.issue_credentials(&issue).await {
            Ok(receipt) => receipt,
            Err(e) => {
                self.state.lock().unwrap().confirming = false;
                return Err(FlowError::Issuance(e.to_string()));
            }
        };

        let events = {
            let mut guard = self.state.lock().unwrap();
            let st = &mut *guard;
            st.confirming = false;
            if st.attempt != attempt {
                return Err(FlowError::Superseded);
            }
            let session = st.session.as_mut().ok_or(FlowError::NoActiveSession)?;
            if session.status() == SessionStatus::Expired {
                // expiry fired while the calls were in flight; the late
                // success must not resurrect the attempt
                return Err(FlowError::Expired);
            }
            let mut events = session.confirm(now).map_err(|e| match e {
                DomainError::CodeExpired => FlowError::Expired,
                other => FlowError::Validation(other),
            })?;
            events.push(DomainEvent::CredentialsIssued(CredentialsIssued {
                national_id: issue.national_id.clone(),
                reference_id: receipt.reference_id.clone(),
                occurred_at: now,
            }));
            events
        };
        self.events.publish(events).await?;
        Ok(())
    }

    /// Persist the confirmed attempt as a registration record. Saving is
    /// an upsert keyed by national id, so a retried finalize cannot
    /// duplicate.
    pub async fn finalize(&self, now: DateTime<Utc>) -> Result<RegistrationId, FlowError> {
        let (registration, events) = {
            let guard = self.state.lock().unwrap();
            let session = guard.session.as_ref().ok_or(FlowError::NoActiveSession)?;
            Registration::from_session(session, now)?
        };
        self.registrations.save(&registration).await?;
        self.events.publish(events).await?;
        Ok(registration.id().clone())
    }

    /// Timer hook, called once per second by the scheduler while a code is
    /// pending. Emits the expiry transition at most once and reports the
    /// remaining seconds, or `None` once there is nothing to count down.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<Option<u32>, FlowError> {
        let (events, remaining) = {
            let mut guard = self.state.lock().unwrap();
            match guard.session.as_mut() {
                Some(session) if session.status() == SessionStatus::Pending => {
                    let events = session.expire_if_due(now);
                    (events, Some(session.remaining_seconds(now)))
                }
                _ => (Vec::new(), None),
            }
        };
        if !events.is_empty() {
            self.events.publish(events).await?;
        }
        Ok(remaining)
    }

    pub fn phase(&self, now: DateTime<Utc>) -> VerificationPhase {
        let guard = self.state.lock().unwrap();
        match guard.session.as_ref() {
            None => VerificationPhase::Idle,
            Some(session) => match session.status() {
                SessionStatus::Confirmed => VerificationPhase::Confirmed,
                SessionStatus::Expired => VerificationPhase::Expired,
                SessionStatus::Pending if now >= session.expires_at() => {
                    VerificationPhase::Expired
                }
                SessionStatus::Pending => VerificationPhase::AwaitingCode {
                    masked_phone: session.phone().masked(),
                    remaining_seconds: session.remaining_seconds(now),
                    expires_at: session.expires_at(),
                },
            },
        }
    }

    /// Back to idle. Any response still in flight for the discarded
    /// attempt will be dropped on arrival.
    pub fn reset(&self) {
        let mut guard = self.state.lock().unwrap();
        guard.session = None;
        guard.attempt += 1;
    }
}

#[async_trait]
impl<G, R, EP> EnrollmentFlow for VerificationService<G, R, EP>
where
    G: VerificationGateway,
    R: RegistrationRepository,
    EP: EventPublisher,
{
    async fn request_code(
        &self,
        enrollment: RawEnrollment,
        now: DateTime<Utc>,
    ) -> Result<MaskedPhone, FlowError> {
        VerificationService::request_code(self, enrollment, now).await
    }

    async fn confirm_code(&self, code: &str, now: DateTime<Utc>) -> Result<(), FlowError> {
        VerificationService::confirm_code(self, code, now).await
    }

    async fn finalize(&self, now: DateTime<Utc>) -> Result<RegistrationId, FlowError> {
        VerificationService::finalize(self, now).await
    }

    async fn tick(&self, now: DateTime<Utc>) -> Result<Option<u32>, FlowError> {
        VerificationService::tick(self, now).await
    }

    fn phase(&self, now: DateTime<Utc>) -> VerificationPhase {
        VerificationService::phase(self, now)
    }

    fn reset(&self) {
        VerificationService::reset(self)
    }
}

#[async_trait]
impl<G, R, EP> CredentialRecovery for VerificationService<G, R, EP>
where
    G: VerificationGateway,
    R: RegistrationRepository,
    EP: EventPublisher,
{
    async fn begin_identity_check(
        &self,
        national_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MaskedPhone, FlowError> {
        VerificationService::begin_identity_check(self, national_id, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use padron_ports::error::{GatewayError, PortError};
    use padron_ports::types::CredentialReceipt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    // --- Mock Adapters ---

    struct MockGateway {
        accepted_code: String,
        fail_send: AtomicBool,
        fail_issue: AtomicBool,
        sent: Mutex<Vec<CodeDispatch>>,
        checks: Mutex<Vec<CodeCheck>>,
        issues: Mutex<Vec<CredentialIssue>>,
    }

    impl Default for MockGateway {
        fn default() -> Self {
            Self {
                accepted_code: "07".into(),
                fail_send: AtomicBool::new(false),
                fail_issue: AtomicBool::new(false),
                sent: Mutex::new(vec![]),
                checks: Mutex::new(vec![]),
                issues: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl VerificationGateway for MockGateway {
        async fn send_code(&self, dispatch: &CodeDispatch) -> Result<(), GatewayError> {
            if self.fail_send.load(Ordering::SeqCst) {
                return Err(GatewayError::Unreachable("connection refused".into()));
            }
            self.sent.lock().unwrap().push(dispatch.clone());
            Ok(())
        }

        async fn confirm_code(&self, check: &CodeCheck) -> Result<(), GatewayError> {
            self.checks.lock().unwrap().push(check.clone());
            if check.code != self.accepted_code {
                return Err(GatewayError::Rejected {
                    reason: "wrong code".into(),
                });
            }
            Ok(())
        }

        async fn issue_credentials(
            &self,
            issue: &CredentialIssue,
        ) -> Result<CredentialReceipt, GatewayError> {
            if self.fail_issue.load(Ordering::SeqCst) {
                return Err(GatewayError::Rejected {
                    reason: "delivery failed".into(),
                });
            }
            self.issues.lock().unwrap().push(issue.clone());
            Ok(CredentialReceipt {
                reference_id: Some("ref-1".into()),
            })
        }
    }

    #[derive(Default)]
    struct MockRegistrationRepo {
        items: Mutex<Vec<Registration>>,
    }

    #[async_trait]
    impl RegistrationRepository for MockRegistrationRepo {
        async fn save(&self, registration: &Registration) -> Result<(), PortError> {
            let mut items = self.items.lock().unwrap();
            if let Some(pos) = items.iter().position(|r| {
                r.registrant().national_id() == registration.registrant().national_id()
            }) {
                items[pos] = registration.clone();
            } else {
                items.push(registration.clone());
            }
            Ok(())
        }

        async fn find_by_national_id(
            &self,
            national_id: &str,
        ) -> Result<Option<Registration>, PortError> {
            let items = self.items.lock().unwrap();
            Ok(items
                .iter()
                .find(|r| r.registrant().national_id().as_str() == national_id)
                .cloned())
        }
    }

    #[derive(Default)]
    struct MockEventPublisher {
        events: Mutex<Vec<DomainEvent>>,
    }

    #[async_trait]
    impl EventPublisher for MockEventPublisher {
        async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), PortError> {
            self.events.lock().unwrap().extend(events);
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339("2025-10-26T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn after(seconds: i64) -> DateTime<Utc> {
        now() + Duration::seconds(seconds)
    }

    fn make_enrollment() -> RawEnrollment {
        RawEnrollment {
            name: "Ana".into(),
            surname: "Gomez".into(),
            national_id: "30111222".into(),
            country_code: "54".into(),
            area_code: "11".into(),
            subscriber_number: "40001234".into(),
        }
    }

    fn make_service() -> VerificationService<MockGateway, MockRegistrationRepo, MockEventPublisher>
    {
        VerificationService::new(
            MockGateway::default(),
            MockRegistrationRepo::default(),
            MockEventPublisher::default(),
        )
    }

    fn event_types<G: VerificationGateway>(
        svc: &VerificationService<G, MockRegistrationRepo, MockEventPublisher>,
    ) -> Vec<&'static str> {
        svc.events
            .events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type())
            .collect()
    }

    #[tokio::test]
    async fn request_code_dispatches_messaging_form() {
        let svc = make_service();

        let masked = svc.request_code(make_enrollment(), now()).await.unwrap();
        assert_eq!(masked.as_str(), "+54 ** *****234");

        let sent = svc.gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].messaging_phone, "5491140001234");
        assert_eq!(sent[0].national_id, "30111222");
        drop(sent);

        match svc.phase(now()) {
            VerificationPhase::AwaitingCode {
                remaining_seconds, ..
            } => assert_eq!(remaining_seconds, 120),
            other => panic!("unexpected phase: {other:?}"),
        }
    }

    #[tokio::test]
    async fn request_code_rejects_invalid_fields_without_dispatch() {
        let svc = make_service();
        let mut enrollment = make_enrollment();
        enrollment.national_id = "12".into();

        let result = svc.request_code(enrollment, now()).await;
        assert!(matches!(result, Err(FlowError::Validation(_))));
        assert!(svc.gateway.sent.lock().unwrap().is_empty());
        assert_eq!(svc.phase(now()), VerificationPhase::Idle);
    }

    #[tokio::test]
    async fn request_code_while_pending_is_noop() {
        let svc = make_service();

        let first = svc.request_code(make_enrollment(), now()).await.unwrap();
        let second = svc
            .request_code(make_enrollment(), after(30))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(svc.gateway.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dispatch_failure_stays_idle() {
        let svc = make_service();
        svc.gateway.fail_send.store(true, Ordering::SeqCst);

        let result = svc.request_code(make_enrollment(), now()).await;
        assert!(matches!(result, Err(FlowError::Dispatch(_))));
        assert_eq!(svc.phase(now()), VerificationPhase::Idle);

        // the registrant may retry once the collaborator recovers
        svc.gateway.fail_send.store(false, Ordering::SeqCst);
        svc.request_code(make_enrollment(), after(5)).await.unwrap();
        assert_eq!(svc.gateway.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn confirm_without_request_is_rejected() {
        let svc = make_service();
        let result = svc.confirm_code("07", now()).await;
        assert!(matches!(result, Err(FlowError::NoActiveSession)));
    }

    #[tokio::test]
    async fn wrong_code_keeps_session_pending() {
        let svc = make_service();
        svc.request_code(make_enrollment(), now()).await.unwrap();

        let result = svc.confirm_code("00", after(30)).await;
        assert!(matches!(result, Err(FlowError::Confirmation(_))));
        assert!(matches!(
            svc.phase(after(30)),
            VerificationPhase::AwaitingCode { .. }
        ));

        // retry with the right code, still inside the window
        svc.confirm_code("07", after(60)).await.unwrap();
        assert_eq!(svc.phase(after(60)), VerificationPhase::Confirmed);
        assert_eq!(svc.gateway.checks.lock().unwrap().len(), 2);
        assert_eq!(svc.gateway.issues.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn confirm_after_deadline_is_expiry_without_network() {
        let svc = make_service();
        svc.request_code(make_enrollment(), now()).await.unwrap();

        let result = svc.confirm_code("07", after(120)).await;
        assert!(matches!(result, Err(FlowError::Expired)));
        // never reached the collaborator, even with the right code
        assert!(svc.gateway.checks.lock().unwrap().is_empty());
        assert_eq!(svc.phase(after(120)), VerificationPhase::Expired);
    }

    #[tokio::test]
    async fn issuance_failure_leaves_session_pending() {
        let svc = make_service();
        svc.request_code(make_enrollment(), now()).await.unwrap();
        svc.gateway.fail_issue.store(true, Ordering::SeqCst);

        let result = svc.confirm_code("07", after(30)).await;
        assert!(matches!(result, Err(FlowError::Issuance(_))));
        assert!(matches!(
            svc.phase(after(30)),
            VerificationPhase::AwaitingCode { .. }
        ));

        // confirmation retry succeeds once issuance recovers
        svc.gateway.fail_issue.store(false, Ordering::SeqCst);
        svc.confirm_code("07", after(45)).await.unwrap();
        assert_eq!(svc.phase(after(45)), VerificationPhase::Confirmed);
    }

    #[tokio::test]
    async fn tick_counts_down_against_wall_clock() {
        let svc = make_service();
        svc.request_code(make_enrollment(), now()).await.unwrap();

        assert_eq!(svc.tick(after(30)).await.unwrap(), Some(90));
        assert_eq!(svc.tick(after(119)).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn tick_expires_exactly_once_then_stops() {
        let svc = make_service();
        svc.request_code(make_enrollment(), now()).await.unwrap();

        assert_eq!(svc.tick(after(121)).await.unwrap(), Some(0));
        assert_eq!(svc.phase(after(121)), VerificationPhase::Expired);

        // countdown is over; no second expiry event
        assert_eq!(svc.tick(after(122)).await.unwrap(), None);
        let expirations = event_types(&svc)
            .iter()
            .filter(|t| **t == "code.expired")
            .count();
        assert_eq!(expirations, 1);

        // late confirm is an expiry error with no network call
        let result = svc.confirm_code("07", after(130)).await;
        assert!(matches!(result, Err(FlowError::Expired)));
        assert!(svc.gateway.checks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_attempt_can_be_restarted() {
        let svc = make_service();
        svc.request_code(make_enrollment(), now()).await.unwrap();
        svc.tick(after(121)).await.unwrap();

        svc.request_code(make_enrollment(), after(130)).await.unwrap();
        assert_eq!(svc.gateway.sent.lock().unwrap().len(), 2);
        assert!(matches!(
            svc.phase(after(130)),
            VerificationPhase::AwaitingCode { .. }
        ));
    }

    #[tokio::test]
    async fn reset_discards_the_attempt() {
        let svc = make_service();
        svc.request_code(make_enrollment(), now()).await.unwrap();

        svc.reset();
        assert_eq!(svc.phase(now()), VerificationPhase::Idle);

        let result = svc.confirm_code("07", after(5)).await;
        assert!(matches!(result, Err(FlowError::NoActiveSession)));
    }

    #[tokio::test]
    async fn finalize_requires_confirmation() {
        let svc = make_service();
        svc.request_code(make_enrollment(), now()).await.unwrap();

        let result = svc.finalize(after(10)).await;
        assert!(matches!(
            result,
            Err(FlowError::Validation(DomainError::VerificationIncomplete))
        ));

        svc.confirm_code("07", after(30)).await.unwrap();
        svc.finalize(after(31)).await.unwrap();

        let items = svc.registrations.items.lock().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].registrant().national_id().as_str(), "30111222");
        assert_eq!(items[0].phone().dispatch(), "541140001234");
    }

    #[tokio::test]
    async fn full_flow_publishes_the_event_trail() {
        let svc = make_service();
        svc.request_code(make_enrollment(), now()).await.unwrap();
        svc.confirm_code("07", after(30)).await.unwrap();
        svc.finalize(after(31)).await.unwrap();

        assert_eq!(
            event_types(&svc),
            vec![
                "code.requested",
                "code.confirmed",
                "credentials.issued",
                "registration.completed",
            ]
        );
    }

    #[tokio::test]
    async fn identity_check_unknown_id_is_rejected() {
        let svc = make_service();
        let result = svc.begin_identity_check("20555666", now()).await;
        assert!(matches!(result, Err(FlowError::NotRegistered)));
        assert!(svc.gateway.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn identity_check_uses_the_phone_on_file() {
        let svc = make_service();

        // enroll first so a registration is on file
        svc.request_code(make_enrollment(), now()).await.unwrap();
        svc.confirm_code("07", after(30)).await.unwrap();
        svc.finalize(after(31)).await.unwrap();
        svc.reset();

        let masked = svc
            .begin_identity_check("30111222", after(3600))
            .await
            .unwrap();
        assert_eq!(masked.as_str(), "+54 ** *****234");

        let sent = svc.gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].messaging_phone, "5491140001234");
    }

    // --- stale-response guards ---

    /// Gateway whose send blocks until the test releases it, to interleave
    /// a reset with an in-flight dispatch.
    #[derive(Default)]
    struct GatedSendGateway {
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl VerificationGateway for GatedSendGateway {
        async fn send_code(&self, _dispatch: &CodeDispatch) -> Result<(), GatewayError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }

        async fn confirm_code(&self, _check: &CodeCheck) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn issue_credentials(
            &self,
            _issue: &CredentialIssue,
        ) -> Result<CredentialReceipt, GatewayError> {
            Ok(CredentialReceipt::default())
        }
    }

    #[tokio::test]
    async fn reset_during_dispatch_drops_the_late_response() {
        let svc = Arc::new(VerificationService::new(
            GatedSendGateway::default(),
            MockRegistrationRepo::default(),
            MockEventPublisher::default(),
        ));

        let task = {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.request_code(make_enrollment(), now()).await })
        };

        svc.gateway.entered.notified().await;
        svc.reset();
        svc.gateway.release.notify_one();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(FlowError::Superseded)));
        assert_eq!(svc.phase(now()), VerificationPhase::Idle);
    }

    /// Gateway whose confirm blocks, to let expiry win the race against an
    /// in-flight confirmation.
    #[derive(Default)]
    struct GatedConfirmGateway {
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
        issues: Mutex<Vec<CredentialIssue>>,
    }

    #[async_trait]
    impl VerificationGateway for GatedConfirmGateway {
        async fn send_code(&self, _dispatch: &CodeDispatch) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn confirm_code(&self, _check: &CodeCheck) -> Result<(), GatewayError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }

        async fn issue_credentials(
            &self,
            issue: &CredentialIssue,
        ) -> Result<CredentialReceipt, GatewayError> {
            self.issues.lock().unwrap().push(issue.clone());
            Ok(CredentialReceipt::default())
        }
    }

    #[tokio::test]
    async fn expiry_during_confirmation_wins_over_the_late_success() {
        let svc = Arc::new(VerificationService::new(
            GatedConfirmGateway::default(),
            MockRegistrationRepo::default(),
            MockEventPublisher::default(),
        ));
        svc.request_code(make_enrollment(), now()).await.unwrap();

        let task = {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.confirm_code("07", after(119)).await })
        };

        svc.gateway.entered.notified().await;
        // the countdown reaches the deadline while the call is in flight
        svc.tick(after(121)).await.unwrap();
        svc.gateway.release.notify_one();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(FlowError::Expired)));
        assert_eq!(svc.phase(after(121)), VerificationPhase::Expired);
        // no credentials.issued event for the dead attempt
        assert!(!event_types(&svc).contains(&"credentials.issued"));
    }
}
