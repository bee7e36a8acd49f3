use std::sync::Arc;

use contact_core::schema::{MSG_EMAIL_REQUIRED, MSG_NAME_TOO_SHORT};
use contact_core::submit::MSG_EMAIL_DUPLICATE;
use contact_core::{
    ClientFieldErrors, ContactRecord, ContactSchema, ContactSubmission, LocalStore,
    RawContactForm, SubmissionResult, SubmitOutcome, COMPLETE_PATH,
};

fn submission(store: LocalStore) -> ContactSubmission<LocalStore> {
    ContactSubmission::new(Arc::new(ContactSchema::new()), store)
}

#[tokio::test]
async fn duplicate_email_is_reported_on_email_field() {
    let store = LocalStore::with_records([ContactRecord::new("Taro", "taro@example.com")]);
    let input = RawContactForm::from_pairs([("name", "田中太郎"), ("email", "taro@example.com")]);

    let result = submission(store.clone())
        .submit(&SubmissionResult::initial(), &input)
        .await
        .expect("submit")
        .into_result()
        .expect("conflict carries a result");

    assert!(!result.success);
    assert!(result.errors.name.is_empty());
    assert_eq!(result.errors.email, vec![MSG_EMAIL_DUPLICATE.to_string()]);
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn happy_path_persists_and_redirects() {
    let store = LocalStore::new();
    let input = RawContactForm::from_pairs([("name", "Test User"), ("email", "test@example.com")]);

    let outcome = submission(store.clone())
        .submit(&SubmissionResult::initial(), &input)
        .await
        .expect("submit");

    assert_eq!(outcome, SubmitOutcome::Redirect(COMPLETE_PATH.to_string()));
    assert_eq!(store.create_calls(), 1);
    assert_eq!(
        store.records().await,
        vec![ContactRecord::new("Test User", "test@example.com")]
    );
}

#[tokio::test]
async fn missing_email_key_reads_as_empty() {
    let store = LocalStore::new();
    let input = RawContactForm::from_pairs([("name", "Test User")]);

    let outcome = submission(store.clone())
        .submit(&SubmissionResult::initial(), &input)
        .await
        .expect("submit");

    match outcome {
        SubmitOutcome::ValidationFailed(errors) => {
            assert!(errors.name.is_empty());
            assert_eq!(errors.email, vec![MSG_EMAIL_REQUIRED.to_string()]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn second_submission_of_same_email_conflicts() {
    let store = LocalStore::new();
    let handler = submission(store.clone());
    let input = RawContactForm::from_pairs([("name", "Test User"), ("email", "test@example.com")]);

    let first = handler
        .submit(&SubmissionResult::initial(), &input)
        .await
        .expect("first submit");
    assert!(first.redirect_path().is_some());

    let second = handler
        .submit(&SubmissionResult::initial(), &input)
        .await
        .expect("second submit");
    assert!(matches!(second, SubmitOutcome::Conflict(_)));
    assert_eq!(store.create_calls(), 1);
}

#[test]
fn blur_then_fix_name() {
    let schema = ContactSchema::new();
    let mut client = ClientFieldErrors::default();

    client.on_field_blur(&schema, "name", "田中");
    assert_eq!(client.name, MSG_NAME_TOO_SHORT);

    client.on_field_blur(&schema, "name", "田中太郎");
    assert_eq!(client.name, "");
    assert_eq!(client.email, "");
}
