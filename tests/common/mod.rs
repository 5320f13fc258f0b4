//! Shared fixtures: an in-memory SQLite store with the real migrations and a
//! mail transport that records what it is asked to send.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use uuid::Uuid;

use formdesk::config::Config;
use formdesk::domain::{FieldDraft, FormDraft, SectionDraft, Session, UserRole};
use formdesk::errors::{AppError, AppResult};
use formdesk::infra::{MailTransport, Migrator, OutgoingMail, Persistence};
use formdesk::services::{
    AuthService, Authenticator, EnrollmentManager, FormManager, SubmissionManager,
};

/// Records sent mail; addresses in `failing` are refused.
#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    failing: HashSet<String>,
}

impl FakeMailer {
    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: addresses.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }

    /// The activation code in the latest mail to `to`.
    pub fn last_code(&self, to: &str) -> Option<String> {
        self.sent()
            .iter()
            .rev()
            .find(|m| m.to == to)
            .and_then(|m| {
                let start = m.body.find("code is ")? + "code is ".len();
                m.body.get(start..start + 6).map(str::to_string)
            })
    }
}

#[async_trait]
impl MailTransport for FakeMailer {
    async fn send_mail(&self, mail: OutgoingMail) -> AppResult<()> {
        if self.failing.contains(&mail.to) {
            return Err(AppError::delivery(format!("relay refused {}", mail.to)));
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }

    async fn shutdown(&self) {}
}

/// Services wired over one migrated in-memory database.
pub struct TestApp {
    pub db: DatabaseConnection,
    pub uow: Arc<Persistence>,
    pub mailer: Arc<FakeMailer>,
    pub config: Config,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_mailer(FakeMailer::default()).await
    }

    pub async fn with_mailer(mailer: FakeMailer) -> Self {
        // A single connection keeps every query on the same in-memory database
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(options).await.expect("sqlite connects");
        Migrator::up(&db, None).await.expect("migrations apply");

        Self {
            uow: Arc::new(Persistence::new(db.clone())),
            db,
            mailer: Arc::new(mailer),
            config: Config::development("sqlite::memory:"),
        }
    }

    pub fn auth(&self) -> Authenticator<Persistence> {
        Authenticator::new(self.uow.clone(), self.config.clone())
    }

    pub fn forms(&self) -> FormManager<Persistence> {
        FormManager::new(self.uow.clone())
    }

    pub fn submissions(&self) -> SubmissionManager<Persistence> {
        SubmissionManager::new(self.uow.clone())
    }

    pub fn enrollment(&self) -> EnrollmentManager<Persistence> {
        EnrollmentManager::new(self.uow.clone(), self.mailer.clone(), &self.config)
    }

    pub async fn admin(&self) -> Session {
        let email = format!("admin-{}@example.com", Uuid::new_v4().simple());
        let user = self
            .auth()
            .create_admin(email, "AdminPass123!".into(), "Admin".into())
            .await
            .expect("admin created");
        Session::new(user.id, user.email, UserRole::Admin)
    }

    pub async fn user(&self, email: &str) -> Session {
        let user = self
            .auth()
            .register(email.into(), "UserPass123!".into(), "Member".into())
            .await
            .expect("user registered");
        Session::new(user.id, user.email, UserRole::User)
    }
}

pub fn field(label: &str, field_type: &str, required: bool, options: &[&str]) -> FieldDraft {
    FieldDraft {
        label: label.to_string(),
        field_type: field_type.to_string(),
        required,
        options: if options.is_empty() {
            None
        } else {
            Some(options.iter().map(|o| o.to_string()).collect())
        },
        ..Default::default()
    }
}

/// Two sections covering every field type.
pub fn survey_draft() -> FormDraft {
    FormDraft {
        title: "Onboarding survey".into(),
        description: Some("Tell us about yourself".into()),
        sections: vec![
            SectionDraft {
                title: "About you".into(),
                fields: vec![
                    field("Name", "TEXT", true, &[]),
                    field("Bio", "TEXTAREA", false, &[]),
                    field("Age", "NUMBER", false, &[]),
                    field("Start date", "DATE", false, &[]),
                ],
                ..Default::default()
            },
            SectionDraft {
                title: "Preferences".into(),
                fields: vec![
                    field("Newsletter", "BOOLEAN", false, &[]),
                    field("Team", "SELECT", false, &["Red", "Blue"]),
                    field("Shirt", "RADIO", false, &["S", "M", "L"]),
                    field("Colours", "CHECKBOX", false, &["Red", "Green", "Blue"]),
                ],
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

/// Answers keyed by the id of the field with each label.
pub fn answers_by_label(
    form: &formdesk::domain::FormDefinition,
    pairs: &[(&str, Value)],
) -> Value {
    let mut map = serde_json::Map::new();
    for (label, value) in pairs {
        let field = form
            .fields()
            .find(|f| f.label == *label)
            .unwrap_or_else(|| panic!("no field labelled {}", label));
        map.insert(field.id.to_string(), value.clone());
    }
    Value::Object(map)
}
