use chrono::Utc;
use rust_decimal_macros::dec;

use super::common::*;
use crate::documents::repository::DocumentRepository;
use crate::reimbursements::domain::{RequestStatus, RequestUpdate};
use crate::reimbursements::repository::RequestRepository;
use crate::reimbursements::service::RequestServiceError;

#[test]
fn create_starts_in_started_with_default_interval() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);

    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");

    assert_eq!(request.status, RequestStatus::Started);
    assert_eq!(request.reminder_interval_days, 3);
    assert_eq!(request.last_reminder_at, None);
    assert_eq!(request.amount_reimbursed, None);
}

#[test]
fn create_rejects_unowned_plan_as_not_found() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);

    match harness
        .request_service
        .create(stranger(), new_request(&plan, &dependent), Utc::now())
    {
        Err(RequestServiceError::NotFound) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn create_rejects_cross_plan_dependent() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let other_plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &other_plan);

    match harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
    {
        Err(RequestServiceError::InvalidAssociation(_)) => {}
        other => panic!("expected invalid association, got {other:?}"),
    }
}

#[test]
fn transition_to_supplemental_docs_seeds_reminder_clock() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");

    let now = Utc::now();
    let updated = harness
        .request_service
        .update(
            owner(),
            request.id,
            RequestUpdate {
                status: Some(RequestStatus::AwaitingSupplementalDocs),
                pending_docs_description: Some("insurer wants the invoice again".to_string()),
                ..RequestUpdate::default()
            },
            now,
        )
        .expect("transition applies");

    assert_eq!(updated.last_reminder_at, Some(now));
    assert_eq!(
        updated.pending_docs_description.as_deref(),
        Some("insurer wants the invoice again")
    );
}

#[test]
fn finalized_requests_always_have_clean_reminder_state() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");

    harness
        .request_service
        .update(
            owner(),
            request.id,
            RequestUpdate {
                status: Some(RequestStatus::AwaitingSupplementalDocs),
                pending_docs_description: Some("missing receipt".to_string()),
                ..RequestUpdate::default()
            },
            Utc::now(),
        )
        .expect("first transition");

    let finalized = harness
        .request_service
        .update(
            owner(),
            request.id,
            RequestUpdate {
                status: Some(RequestStatus::Finalized),
                amount_reimbursed: Some(dec!(180.00)),
                ..RequestUpdate::default()
            },
            Utc::now(),
        )
        .expect("finalizes");

    assert_eq!(finalized.status, RequestStatus::Finalized);
    assert_eq!(finalized.last_reminder_at, None);
    assert_eq!(finalized.pending_docs_description, None);
    assert_eq!(finalized.amount_reimbursed, Some(dec!(180.00)));
}

#[test]
fn update_rejects_sub_daily_reminder_interval() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");

    match harness.request_service.update(
        owner(),
        request.id,
        RequestUpdate {
            reminder_interval_days: Some(0),
            ..RequestUpdate::default()
        },
        Utc::now(),
    ) {
        Err(RequestServiceError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn update_on_foreign_request_is_not_found() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");

    match harness.request_service.update(
        stranger(),
        request.id,
        RequestUpdate::default(),
        Utc::now(),
    ) {
        Err(RequestServiceError::NotFound) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn send_to_insurer_advances_only_from_ready_to_send() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");

    let sent = harness
        .request_service
        .send_to_insurer(owner(), request.id, Utc::now())
        .expect("package sends");
    assert_eq!(sent.status, RequestStatus::Started);

    harness
        .request_service
        .update(
            owner(),
            request.id,
            RequestUpdate {
                status: Some(RequestStatus::ReadyToSend),
                ..RequestUpdate::default()
            },
            Utc::now(),
        )
        .expect("moves to ready");

    let sent = harness
        .request_service
        .send_to_insurer(owner(), request.id, Utc::now())
        .expect("package sends");
    assert_eq!(sent.status, RequestStatus::ProtocolOpen);

    let packages = harness.notifier.packages();
    assert_eq!(packages.len(), 2);
    assert_eq!(packages[0].0, owner().user_id);
    assert_eq!(
        packages[0].1.insurer_email.as_deref(),
        Some("reembolso@amparo.example")
    );
}

#[test]
fn failed_package_send_leaves_status_untouched() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");
    harness
        .request_service
        .update(
            owner(),
            request.id,
            RequestUpdate {
                status: Some(RequestStatus::ReadyToSend),
                ..RequestUpdate::default()
            },
            Utc::now(),
        )
        .expect("moves to ready");

    *harness.notifier.fail_sends.lock().unwrap() = true;
    match harness
        .request_service
        .send_to_insurer(owner(), request.id, Utc::now())
    {
        Err(RequestServiceError::Notify(_)) => {}
        other => panic!("expected notify error, got {other:?}"),
    }

    let stored = harness
        .requests
        .fetch(request.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.status, RequestStatus::ReadyToSend);
}

#[test]
fn delete_cascades_direct_documents_and_detaches_recurring() {
    use crate::catalog::DocumentKind;
    use crate::documents::domain::DocumentUpload;

    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");

    let invoice = harness
        .document_service
        .upload(
            owner(),
            DocumentUpload {
                kind: DocumentKind::NotaFiscal,
                request_id: Some(request.id),
                is_recurrent: false,
                original_name: "nota.pdf".to_string(),
                mime: "application/pdf".parse().unwrap(),
                bytes: vec![1u8; 64],
            },
            Utc::now(),
        )
        .expect("invoice uploads");

    let referral = harness
        .document_service
        .upload(
            owner(),
            DocumentUpload {
                kind: DocumentKind::EncaminhamentoMedico,
                request_id: None,
                is_recurrent: true,
                original_name: "encaminhamento.pdf".to_string(),
                mime: "application/pdf".parse().unwrap(),
                bytes: vec![1u8; 64],
            },
            Utc::now(),
        )
        .expect("referral uploads");
    harness
        .document_service
        .link_recurrent(owner(), referral.id, request.id, Utc::now())
        .expect("referral links");

    harness
        .request_service
        .delete(owner(), request.id)
        .expect("request deletes");

    assert!(harness.requests.fetch(request.id).unwrap().is_none());
    assert!(harness.documents.fetch(invoice.id).unwrap().is_none());
    assert!(!harness.files.contains(&invoice.stored_name));
    // The recurring referral survives for reuse; only its link goes away.
    assert!(harness.documents.fetch(referral.id).unwrap().is_some());
    assert!(harness
        .documents
        .links_for_request(request.id)
        .unwrap()
        .is_empty());
}

#[test]
fn detail_reports_missing_kinds_for_bare_consultation() {
    use crate::catalog::DocumentKind;

    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");

    let detail = harness
        .request_service
        .get(owner(), request.id)
        .expect("detail loads");

    assert_eq!(
        detail.completeness.missing_kinds,
        vec![DocumentKind::NotaFiscal, DocumentKind::ComprovantePagamento]
    );
    assert_eq!(detail.completeness.ratio, 0.0);
    assert!(detail.documents.is_empty());
}
