//! Bulk enrollment and the OTP activation handshake.
//!
//! Enrolled accounts start without a password. Each one is mailed a one-time
//! code; [`EnrollmentService::complete_activation`] trades a valid code for a
//! password.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{Config, MAX_OTP_ATTEMPTS};
use crate::domain::{
    normalize_email, parse_enrollment_table, ActivationState, EnrollmentOutcome,
    EnrollmentRecord, EnrollmentReport, EnrollmentStatus, OneTimePassword, Password, PendingOtp,
    Session,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{MailTransport, NewAccount, OutgoingMail, UnitOfWork};

#[async_trait]
pub trait EnrollmentService: Send + Sync {
    /// Parse a CSV enrollment table (admin only)
    async fn parse(&self, session: &Session, table: &str) -> AppResult<Vec<EnrollmentRecord>>;

    /// Create accounts for valid records and start their activation (admin only)
    async fn enroll(
        &self,
        session: &Session,
        records: Vec<EnrollmentRecord>,
    ) -> AppResult<EnrollmentReport>;

    /// Mail a fresh activation code; unknown emails succeed silently
    async fn request_otp(&self, email: &str) -> AppResult<()>;

    /// Set the password of an account holding a valid code
    async fn complete_activation(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> AppResult<()>;

    /// Where an enrollee is in the handshake (admin only)
    async fn activation_state(&self, session: &Session, email: &str)
        -> AppResult<ActivationState>;
}

/// Result of checking a code inside the activation transaction
enum CodeCheck {
    Accepted,
    Rejected,
}

pub struct EnrollmentManager<U: UnitOfWork> {
    uow: Arc<U>,
    mailer: Arc<dyn MailTransport>,
    otp_ttl_minutes: i64,
    fanout: usize,
}

impl<U: UnitOfWork> EnrollmentManager<U> {
    pub fn new(uow: Arc<U>, mailer: Arc<dyn MailTransport>, config: &Config) -> Self {
        Self {
            uow,
            mailer,
            otp_ttl_minutes: config.otp_ttl_minutes,
            fanout: config.enrollment_fanout.max(1),
        }
    }

    /// Store a fresh code for `email` and mail it.
    async fn issue_otp(&self, email: &str, name: &str) -> AppResult<()> {
        let otp = OneTimePassword::generate();
        self.uow
            .activation()
            .save(PendingOtp::issue(email, &otp, self.otp_ttl_minutes))
            .await?;

        self.mailer
            .send_mail(activation_mail(email, name, &otp, self.otp_ttl_minutes))
            .await
    }

    /// Issue a code for a freshly enrolled account, recording any failure.
    async fn deliver(&self, record: EnrollmentRecord) -> EnrollmentOutcome {
        match self.issue_otp(&record.email, &record.name).await {
            Ok(()) => EnrollmentOutcome::new(&record, EnrollmentStatus::OtpSent, None),
            Err(e) => {
                tracing::warn!(email = %record.email, error = %e, "Activation code not delivered");
                EnrollmentOutcome::new(&record, EnrollmentStatus::DeliveryFailed, Some(e.to_string()))
            }
        }
    }
}

fn activation_mail(email: &str, name: &str, otp: &OneTimePassword, ttl_minutes: i64) -> OutgoingMail {
    OutgoingMail::new(
        email,
        "Activate your account",
        format!(
            "Hello {},\n\n\
             Your activation code is {}. It expires in {} minutes.\n\n\
             Enter it together with your new password to activate your account.\n\
             If you did not expect this message you can ignore it.\n",
            name,
            otp.as_str(),
            ttl_minutes
        ),
    )
}

#[async_trait]
impl<U: UnitOfWork> EnrollmentService for EnrollmentManager<U> {
    async fn parse(&self, session: &Session, table: &str) -> AppResult<Vec<EnrollmentRecord>> {
        session.require_admin()?;
        parse_enrollment_table(table)
    }

    async fn enroll(
        &self,
        session: &Session,
        records: Vec<EnrollmentRecord>,
    ) -> AppResult<EnrollmentReport> {
        session.require_admin()?;

        let mut outcomes = Vec::with_capacity(records.len());
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for mut record in records {
            record.revalidate();
            if !record.valid {
                let reason = record.reason.clone();
                outcomes.push(EnrollmentOutcome::new(&record, EnrollmentStatus::Invalid, reason));
            } else if !seen.insert(record.email.clone()) {
                outcomes.push(EnrollmentOutcome::new(
                    &record,
                    EnrollmentStatus::Skipped,
                    Some("Duplicate email in this batch".to_string()),
                ));
            } else {
                candidates.push(record);
            }
        }

        let existing: HashSet<String> = self
            .uow
            .users()
            .existing_emails(candidates.iter().map(|r| r.email.clone()).collect())
            .await?
            .into_iter()
            .collect();

        let mut fresh = Vec::with_capacity(candidates.len());
        for record in candidates {
            if existing.contains(&record.email) {
                outcomes.push(EnrollmentOutcome::new(
                    &record,
                    EnrollmentStatus::Skipped,
                    Some("Email is already registered".to_string()),
                ));
                continue;
            }
            let password_hash = record
                .password
                .as_deref()
                .map(|p| Password::new(p).map(Password::into_string))
                .transpose()?;
            let account = NewAccount::user(record.email.clone(), record.name.clone(), password_hash);
            fresh.push((record, account));
        }

        let created: HashSet<String> = self
            .uow
            .users()
            .create_many(fresh.iter().map(|(_, account)| account.clone()).collect())
            .await?
            .into_iter()
            .map(|u| u.email)
            .collect();

        let mut awaiting_otp = Vec::new();
        for (record, account) in fresh {
            if !created.contains(&record.email) {
                // Registered concurrently between the lookup and the insert
                outcomes.push(EnrollmentOutcome::new(
                    &record,
                    EnrollmentStatus::Skipped,
                    Some("Email is already registered".to_string()),
                ));
            } else if account.password_hash.is_some() {
                outcomes.push(EnrollmentOutcome::new(&record, EnrollmentStatus::Activated, None));
            } else {
                awaiting_otp.push(record);
            }
        }

        let deliveries: Vec<_> = awaiting_otp
            .into_iter()
            .map(|record| self.deliver(record))
            .collect();
        let delivered: Vec<EnrollmentOutcome> = stream::iter(deliveries)
            .buffered(self.fanout)
            .collect()
            .await;
        outcomes.extend(delivered);

        let report = EnrollmentReport::from_outcomes(outcomes);
        tracing::info!(
            created = report.created,
            skipped = report.skipped,
            failed = report.failed,
            admin = %session.user_id,
            "Enrollment batch processed"
        );
        Ok(report)
    }

    async fn request_otp(&self, email: &str) -> AppResult<()> {
        let email = normalize_email(email);
        let Some(user) = self.uow.users().find_by_email(&email).await? else {
            tracing::debug!("Activation code requested for an unknown email");
            return Ok(());
        };

        self.issue_otp(&user.email, &user.name).await
    }

    async fn complete_activation(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> AppResult<()> {
        Password::check_policy(new_password).map_err(|e| AppError::bad_request(e.to_string()))?;
        let password_hash = Password::new(new_password)?.into_string();

        let email = normalize_email(email);
        let code = otp.trim().to_string();

        let check = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let Some(pending) = ctx.activation().find(&email).await? else {
                        return Ok(CodeCheck::Rejected);
                    };
                    if pending.is_expired(Utc::now()) || pending.attempts >= MAX_OTP_ATTEMPTS {
                        return Ok(CodeCheck::Rejected);
                    }
                    if !pending.accepts(&code) {
                        // Counted and committed, the caller still sees a rejection
                        let attempts = ctx
                            .activation()
                            .record_failure(&email)
                            .await?
                            .unwrap_or(MAX_OTP_ATTEMPTS);
                        if attempts >= MAX_OTP_ATTEMPTS {
                            ctx.activation().discard(&email).await?;
                        }
                        return Ok(CodeCheck::Rejected);
                    }

                    let user = ctx.users().find_by_email(&email).await?.ok_or_not_found()?;
                    ctx.users().activate(user.id, password_hash).await?;
                    ctx.activation().discard(&email).await?;
                    Ok(CodeCheck::Accepted)
                })
            })
            .await?;

        match check {
            CodeCheck::Accepted => {
                tracing::info!("Account activated");
                Ok(())
            }
            CodeCheck::Rejected => Err(AppError::InvalidOrExpiredOtp),
        }
    }

    async fn activation_state(
        &self,
        session: &Session,
        email: &str,
    ) -> AppResult<ActivationState> {
        session.require_admin()?;
        let email = normalize_email(email);

        let user = self.uow.users().find_by_email(&email).await?.ok_or_not_found()?;
        if user.has_password() {
            return Ok(ActivationState::Activated);
        }

        match self.uow.activation().find(&email).await? {
            Some(_) => Ok(ActivationState::OtpRequested),
            None => Ok(ActivationState::Created),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserRole};
    use crate::infra::{
        ActivationRepository, FormRepository, MockActivationRepository, MockMailTransport,
        MockUserRepository, SubmissionRepository, TransactionContext, UserRepository,
    };

    struct MockUnitOfWork {
        users: Arc<MockUserRepository>,
        activation: Arc<MockActivationRepository>,
    }

    #[async_trait]
    impl UnitOfWork for MockUnitOfWork {
        fn users(&self) -> Arc<dyn UserRepository> {
            self.users.clone()
        }

        fn forms(&self) -> Arc<dyn FormRepository> {
            unimplemented!("forms are not used by enrollment")
        }

        fn submissions(&self) -> Arc<dyn SubmissionRepository> {
            unimplemented!("submissions are not used by enrollment")
        }

        fn activation(&self) -> Arc<dyn ActivationRepository> {
            self.activation.clone()
        }

        async fn transaction<F, T>(&self, _f: F) -> AppResult<T>
        where
            F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                    Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
                > + Send,
            T: Send,
        {
            Err(AppError::internal("Transactions not supported in test mock"))
        }
    }

    fn manager(
        users: MockUserRepository,
        activation: MockActivationRepository,
        mailer: MockMailTransport,
    ) -> EnrollmentManager<MockUnitOfWork> {
        let uow = Arc::new(MockUnitOfWork {
            users: Arc::new(users),
            activation: Arc::new(activation),
        });
        EnrollmentManager::new(uow, Arc::new(mailer), &Config::development("sqlite::memory:"))
    }

    fn enrollee(email: &str) -> User {
        User {
            id: uuid::Uuid::new_v4(),
            email: email.to_string(),
            password_hash: None,
            name: "Ada".to_string(),
            role: UserRole::User,
            email_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_request_otp_unknown_email_is_silent() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let mut mailer = MockMailTransport::new();
        mailer.expect_send_mail().never();

        let service = manager(users, MockActivationRepository::new(), mailer);
        assert!(service.request_otp("ghost@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_request_otp_stores_digest_and_mails_code() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|email| {
            assert_eq!(email, "ada@example.com");
            Ok(Some(enrollee(email)))
        });

        let mut activation = MockActivationRepository::new();
        activation
            .expect_save()
            .withf(|otp| otp.email == "ada@example.com" && otp.attempts == 0)
            .times(1)
            .returning(|_| Ok(()));

        let mut mailer = MockMailTransport::new();
        mailer
            .expect_send_mail()
            .withf(|mail| mail.to == "ada@example.com" && mail.body.contains("activation code"))
            .times(1)
            .returning(|_| Ok(()));

        let service = manager(users, activation, mailer);
        service.request_otp("  Ada@Example.com ").await.unwrap();
    }

    #[tokio::test]
    async fn test_request_otp_surfaces_delivery_failure() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(enrollee(email))));
        let mut activation = MockActivationRepository::new();
        activation.expect_save().returning(|_| Ok(()));
        let mut mailer = MockMailTransport::new();
        mailer
            .expect_send_mail()
            .returning(|_| Err(AppError::delivery("relay down")));

        let service = manager(users, activation, mailer);
        let result = service.request_otp("ada@example.com").await;
        assert!(matches!(result, Err(AppError::Delivery(_))));
    }

    #[tokio::test]
    async fn test_weak_password_rejected_before_any_lookup() {
        let service = manager(
            MockUserRepository::new(),
            MockActivationRepository::new(),
            MockMailTransport::new(),
        );
        let result = service
            .complete_activation("ada@example.com", "123456", "short")
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_enroll_requires_admin() {
        let service = manager(
            MockUserRepository::new(),
            MockActivationRepository::new(),
            MockMailTransport::new(),
        );
        let session = Session::new(uuid::Uuid::new_v4(), "u@example.com", UserRole::User);
        let result = service.enroll(&session, Vec::new()).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }
}
