//! Form definition store against SQLite.

mod common;

use std::collections::HashSet;

use common::{field, survey_draft, TestApp};
use formdesk::domain::{FieldType, FormDraft, NewField, NewForm, NewSection, SectionDraft};
use formdesk::errors::AppError;
use formdesk::infra::UnitOfWork;
use formdesk::services::FormService;
use formdesk::with_transaction;

#[tokio::test]
async fn test_create_returns_ordered_structure() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let form = app.forms().create(&admin, survey_draft()).await.unwrap();

    assert_eq!(form.version, 1);
    assert!(form.is_active);
    assert_eq!(form.created_by, admin.user_id);
    assert_eq!(form.sections.len(), 2);
    assert_eq!(form.sections[0].title, "About you");
    assert_eq!(form.sections[1].order, 2);

    let labels: Vec<&str> = form.sections[1].fields.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, ["Newsletter", "Team", "Shirt", "Colours"]);
    let orders: Vec<i32> = form.sections[1].fields.iter().map(|f| f.order).collect();
    assert_eq!(orders, [1, 2, 3, 4]);

    let colours = form.fields().find(|f| f.label == "Colours").unwrap();
    assert_eq!(colours.field_type, FieldType::Checkbox);
    assert_eq!(colours.options, ["Red", "Green", "Blue"]);

    let loaded = app.forms().get(form.id).await.unwrap();
    assert_eq!(loaded.structure_ids(), form.structure_ids());
}

#[tokio::test]
async fn test_explicit_orders_are_normalized() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let mut first = field("First", "TEXT", false, &[]);
    first.order = Some(10);
    let mut second = field("Second", "TEXT", false, &[]);
    second.order = Some(3);

    let draft = FormDraft {
        title: "Ordering".into(),
        sections: vec![SectionDraft {
            fields: vec![first, second],
            ..Default::default()
        }],
        ..Default::default()
    };

    let form = app.forms().create(&admin, draft).await.unwrap();
    let fields = &form.sections[0].fields;
    assert_eq!(fields[0].label, "Second");
    assert_eq!(fields[0].order, 1);
    assert_eq!(fields[1].label, "First");
    assert_eq!(fields[1].order, 2);
}

#[tokio::test]
async fn test_invalid_draft_creates_nothing() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let mut draft = survey_draft();
    draft.sections[1].fields.push(field("Broken", "SELECT", true, &[]));
    draft.sections[0].fields.push(field("Odd", "SLIDER", false, &[]));

    let Err(AppError::BadRequest(message)) = app.forms().create(&admin, draft).await else {
        panic!("expected BadRequest");
    };
    assert!(message.contains("SELECT fields need at least one option"));
    assert!(message.contains("unknown field type 'SLIDER'"));

    assert!(app.forms().list_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_writes_require_admin() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let member = app.user("member@example.com").await;

    let result = app.forms().create(&member, survey_draft()).await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    let form = app.forms().create(&admin, survey_draft()).await.unwrap();
    assert!(matches!(
        app.forms().replace(&member, form.id, survey_draft()).await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        app.forms().delete(&member, form.id).await,
        Err(AppError::Forbidden)
    ));
}

#[tokio::test]
async fn test_replace_swaps_structure_and_bumps_version() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let original = app.forms().create(&admin, survey_draft()).await.unwrap();

    let replacement = FormDraft {
        title: "Onboarding survey v2".into(),
        sections: vec![SectionDraft {
            title: "Only".into(),
            fields: vec![field("Name", "TEXT", true, &[])],
            ..Default::default()
        }],
        ..Default::default()
    };
    app.forms()
        .replace(&admin, original.id, replacement)
        .await
        .unwrap();

    let current = app.forms().get(original.id).await.unwrap();
    assert_eq!(current.title, "Onboarding survey v2");
    assert_eq!(current.description, None);
    assert_eq!(current.version, 2);
    assert_eq!(current.sections.len(), 1);

    let before: HashSet<_> = original.structure_ids().into_iter().collect();
    assert!(current.structure_ids().iter().all(|id| !before.contains(id)));
}

#[tokio::test]
async fn test_rejected_replace_keeps_old_structure() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let original = app.forms().create(&admin, survey_draft()).await.unwrap();

    let mut draft = survey_draft();
    draft.title = "Renamed".into();
    draft.sections[0].fields.push(field("Broken", "RADIO", true, &[]));

    let result = app.forms().replace(&admin, original.id, draft).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let current = app.forms().get(original.id).await.unwrap();
    assert_eq!(current.title, "Onboarding survey");
    assert_eq!(current.version, 1);
    assert_eq!(current.structure_ids(), original.structure_ids());
}

#[tokio::test]
async fn test_failed_structure_write_rolls_back_replace() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let original = app.forms().create(&admin, survey_draft()).await.unwrap();

    let section = |title: &str| NewSection {
        title: title.to_string(),
        order: 1,
        fields: vec![NewField {
            label: "Name".into(),
            field_type: FieldType::Text,
            required: true,
            order: 1,
            placeholder: None,
            options: Vec::new(),
        }],
    };
    // Two sections sharing an order break the (form, order) index mid-write
    let clashing = NewForm {
        title: "Half written".into(),
        description: None,
        is_active: Some(false),
        sections: vec![section("A"), section("B")],
    };

    let form_id = original.id;
    let result: Result<i32, AppError> =
        with_transaction!(app.uow, |ctx| ctx.forms().replace(form_id, clashing).await);
    assert!(result.is_err());

    let current = app.forms().get(original.id).await.unwrap();
    assert_eq!(current.title, "Onboarding survey");
    assert_eq!(current.version, 1);
    assert!(current.is_active);
    assert_eq!(current.structure_ids(), original.structure_ids());
}

#[tokio::test]
async fn test_locked_header_tracks_version_and_active_flag() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let form = app.forms().create(&admin, survey_draft()).await.unwrap();
    let form_id = form.id;

    let header = with_transaction!(app.uow, |ctx| ctx.forms().lock_header(form_id).await).unwrap();
    assert_eq!(header, Some((1, true)));

    let mut draft = survey_draft();
    draft.is_active = Some(false);
    app.forms().replace(&admin, form_id, draft).await.unwrap();

    let header = with_transaction!(app.uow, |ctx| ctx.forms().lock_header(form_id).await).unwrap();
    assert_eq!(header, Some((2, false)));

    let missing = uuid::Uuid::new_v4();
    let header = with_transaction!(app.uow, |ctx| ctx.forms().lock_header(missing).await).unwrap();
    assert_eq!(header, None);
}

#[tokio::test]
async fn test_replace_can_deactivate_and_unknown_form_is_not_found() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let form = app.forms().create(&admin, survey_draft()).await.unwrap();

    let mut draft = survey_draft();
    draft.is_active = Some(false);
    app.forms().replace(&admin, form.id, draft).await.unwrap();

    assert!(app.forms().list_active().await.unwrap().is_empty());
    assert!(!app.forms().get(form.id).await.unwrap().is_active);

    let result = app
        .forms()
        .replace(&admin, uuid::Uuid::new_v4(), survey_draft())
        .await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_delete_unused_form() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let form = app.forms().create(&admin, survey_draft()).await.unwrap();

    app.forms().delete(&admin, form.id).await.unwrap();

    assert!(matches!(app.forms().get(form.id).await, Err(AppError::NotFound)));
    assert!(matches!(
        app.forms().delete(&admin, form.id).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_list_active_summaries() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let kept = app.forms().create(&admin, survey_draft()).await.unwrap();
    let mut hidden = survey_draft();
    hidden.title = "Hidden".into();
    hidden.is_active = Some(false);
    app.forms().create(&admin, hidden).await.unwrap();

    let listed = app.forms().list_active().await.unwrap();
    assert_eq!(listed, vec![kept.summary()]);
}
