//! # Lifecycle Flows
//!
//! End-to-end workflow scenarios across the engine, store, gate, bus,
//! and audit trail:
//!
//! 1. **Happy Path**: upload → approve → sign internal → download
//! 2. **Rejection**: reject with reason, re-upload resets the review
//! 3. **External Signing**: approved document completed by ingestion
//! 4. **Gating**: role and state preconditions refuse precisely

#[cfg(test)]
mod tests {
    use crate::fixtures::{reupload_request, upload_request, EngineFixture};
    use shared_bus::{EventFilter, EventTopic, WorkflowEvent};
    use shared_crypto::verify_pss;
    use shared_types::{DocumentStatus, SignatureKind};
    use std::io::Cursor;
    use vd_02_audit_trail::{AuditAction, AuditQuery, AuditTrail};
    use vd_03_workflow_engine::{
        BackgroundTask, ExternalSignedUpload, WorkflowApi, WorkflowError,
    };

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    #[tokio::test]
    async fn test_upload_approve_sign_internal_flow() {
        let fx = EngineFixture::new();

        // SENDER uploads "Contract A".
        let document = fx.submit("Contract A", b"contract a body").await;
        assert_eq!(document.status, DocumentStatus::Pending);
        assert_eq!(document.creator, fx.sender.id);
        assert!(document.approved_version.is_none());

        let v1 = fx.store.latest_version(document.id).unwrap();
        assert_eq!(v1.version_number, 1);

        // CHECKER approves; v1 is frozen as the approved version.
        let document = fx.engine.approve(fx.checker, document.id, None).await.unwrap();
        assert_eq!(document.status, DocumentStatus::ApprovedForSigning);
        assert_eq!(document.approved_version, Some(v1.id));

        // MANAGER signs internally.
        let (document, signature) = fx
            .engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap();
        assert_eq!(document.status, DocumentStatus::CompletedInternal);
        assert_eq!(signature.kind, SignatureKind::Internal);
        assert_eq!(signature.signer, Some(fx.manager.id));
        assert_eq!(signature.version, v1.id);

        // The signature validates against H1 and the stored public key.
        let digest = v1.content_hash.to_digest().unwrap();
        let pem = signature.public_key_pem.as_deref().unwrap();
        assert!(verify_pss(&digest, &signature.signature_bytes, pem).unwrap());

        // And through the engine's own verification path.
        assert!(fx.engine.verify_signature(signature.id).await.unwrap());

        // The audit trail recorded the whole story in order.
        let actions: Vec<AuditAction> = fx
            .trail
            .query(&AuditQuery::for_document(document.id))
            .iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::Upload,
                AuditAction::Approve,
                AuditAction::SignInternal,
                AuditAction::HashVerified,
            ]
        );
    }

    #[tokio::test]
    async fn test_download_after_completion() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract A", b"contract a body").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();
        fx.engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap();

        let (token, version) = fx
            .engine
            .download_approved(fx.manager, document.id)
            .await
            .unwrap();
        assert_eq!(version.version_number, 1);

        let grant = fx.gate.redeem(&token).unwrap();
        assert_eq!(grant.version_id, version.id);
        assert_eq!(grant.filename, "contract-a.pdf");
    }

    #[tokio::test]
    async fn test_creator_may_download_despite_sender_role() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract A", b"contract a body").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();

        // The SENDER role is not in the download table, but the creator is
        // allowed through ownership.
        let result = fx.engine.download_approved(fx.sender, document.id).await;
        assert!(result.is_ok());

        // A different sender is refused.
        let stranger = shared_types::Actor::with_role(shared_types::Role::Sender);
        let err = fx
            .engine
            .download_approved(stranger, document.id)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::RoleDenied { .. }));
    }

    // =========================================================================
    // REJECTION AND RE-UPLOAD
    // =========================================================================

    #[tokio::test]
    async fn test_reject_then_reupload_resets_review() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract B", b"first draft").await;

        let document = fx
            .engine
            .reject(fx.checker, document.id, "missing appendix")
            .await
            .unwrap();
        assert_eq!(document.status, DocumentStatus::Rejected);

        // The rejection reason is in the audit trail.
        let rejects = fx
            .trail
            .query(&AuditQuery::for_document(document.id).action(AuditAction::Reject));
        assert_eq!(rejects.len(), 1);
        assert_eq!(
            rejects[0].details.get("reason").map(String::as_str),
            Some("missing appendix")
        );

        // Re-upload: a NEW version, never a rewrite of the rejected one.
        let document = fx
            .engine
            .upload(fx.sender, reupload_request(document.id, b"second draft"))
            .await
            .unwrap();
        assert_eq!(document.status, DocumentStatus::Pending);
        assert!(document.approved_version.is_none());

        let versions = fx.store.versions_of(document.id);
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].version_number, 2);
        assert_ne!(versions[0].content_hash, versions[1].content_hash);
    }

    #[tokio::test]
    async fn test_reject_requires_non_empty_reason() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract C", b"body").await;

        for reason in ["", "   "] {
            let err = fx
                .engine
                .reject(fx.checker, document.id, reason)
                .await
                .unwrap_err();
            assert!(matches!(err, WorkflowError::EmptyRejectReason));
        }

        // Refused before any state mutation.
        let document = fx.store.document(document.id).unwrap();
        assert_eq!(document.status, DocumentStatus::Pending);
        assert!(fx
            .trail
            .query(&AuditQuery::for_document(document.id).action(AuditAction::Reject))
            .is_empty());
    }

    // =========================================================================
    // EXTERNAL SIGNING
    // =========================================================================

    #[tokio::test]
    async fn test_external_signed_upload_completes_document() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract D", b"unsigned body").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();

        let (document, signature) = fx
            .engine
            .upload_external_signed(
                fx.manager,
                document.id,
                ExternalSignedUpload {
                    filename: "contract-d-signed.pdf".into(),
                    certificate: Some("-----BEGIN CERTIFICATE-----\n...".into()),
                    metadata: Default::default(),
                    content: Box::new(Cursor::new(b"signed body with embedded signature".to_vec())),
                },
            )
            .await
            .unwrap();

        assert_eq!(document.status, DocumentStatus::CompletedExternal);
        assert_eq!(signature.kind, SignatureKind::External);
        assert_eq!(signature.signer, None);

        // The signed file became version 2 and the new approved version.
        let v2 = fx.store.latest_version(document.id).unwrap();
        assert_eq!(v2.version_number, 2);
        assert_eq!(document.approved_version, Some(v2.id));
        assert_eq!(signature.version, v2.id);

        // The stored signature bytes are the signed file's digest.
        assert_eq!(
            signature.signature_bytes,
            v2.content_hash.to_digest().unwrap().to_vec()
        );
    }

    // =========================================================================
    // DUPLICATE SIGNED CONTENT (409)
    // =========================================================================

    #[tokio::test]
    async fn test_resubmitting_signed_artifact_conflicts() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract E", b"the artifact").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();
        fx.engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap();

        // Same bytes as a brand-new document: refused.
        let err = fx
            .engine
            .upload(fx.sender, upload_request("Contract E again", b"the artifact"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateSignedContent { .. }));

        // Different bytes are fine.
        assert!(fx
            .engine
            .upload(fx.sender, upload_request("Contract F", b"another artifact"))
            .await
            .is_ok());
    }

    // =========================================================================
    // ROLE AND STATE GATING
    // =========================================================================

    #[tokio::test]
    async fn test_role_gates_refuse_and_audit() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract G", b"body").await;

        // CHECKER may not upload.
        let err = fx
            .engine
            .upload(fx.checker, upload_request("X", b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::RoleDenied { .. }));

        // SENDER may not approve; MANAGER may not approve.
        for actor in [fx.sender, fx.manager] {
            let err = fx
                .engine
                .approve(actor, document.id, None)
                .await
                .unwrap_err();
            assert!(matches!(err, WorkflowError::RoleDenied { .. }));
        }

        // CHECKER may not sign.
        let err = fx
            .engine
            .sign_internal(fx.checker, document.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::RoleDenied { .. }));

        // Every refusal left a denied-action record and nothing else.
        let denied = fx
            .trail
            .query(&AuditQuery::default().action(AuditAction::ActionDenied));
        assert_eq!(denied.len(), 4);
        assert_eq!(
            fx.store.document(document.id).unwrap().status,
            DocumentStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_state_gates_name_the_violation() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract H", b"body").await;

        // Sign before approval.
        let err = fx
            .engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidState {
                current: DocumentStatus::Pending,
                required: "APPROVED_FOR_SIGNING",
            }
        ));

        // Approve twice.
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();
        let err = fx
            .engine
            .approve(fx.admin, document.id, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidState {
                current: DocumentStatus::ApprovedForSigning,
                required: "PENDING",
            }
        ));

        // No upload onto a completed document.
        fx.engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap();
        let err = fx
            .engine
            .upload(fx.sender, reupload_request(document.id, b"late edit"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidState {
                current: DocumentStatus::CompletedInternal,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_sign_without_configured_key() {
        let fx = EngineFixture::without_signer();
        let document = fx.submit("Contract I", b"body").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();

        let err = fx
            .engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Crypto(shared_crypto::CryptoError::KeyUnavailable)
        ));

        // Never silently treated as "not signed": status is unchanged.
        assert_eq!(
            fx.store.document(document.id).unwrap().status,
            DocumentStatus::ApprovedForSigning
        );
    }

    // =========================================================================
    // EVENTS AND BACKGROUND TASKS
    // =========================================================================

    #[tokio::test]
    async fn test_events_follow_the_lifecycle() {
        let fx = EngineFixture::new();
        let mut sub = fx.bus.subscribe(EventFilter::topics(vec![
            EventTopic::Lifecycle,
            EventTopic::Signing,
        ]));

        let document = fx.submit("Contract J", b"body").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();
        fx.engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap();

        let mut kinds = Vec::new();
        while let Ok(Some(event)) = sub.try_recv() {
            kinds.push(match event {
                WorkflowEvent::DocumentSubmitted { .. } => "submitted",
                WorkflowEvent::DocumentApproved { .. } => "approved",
                WorkflowEvent::DocumentSigned { .. } => "signed",
                _ => "other",
            });
        }
        assert_eq!(kinds, vec!["submitted", "approved", "signed"]);
    }

    #[tokio::test]
    async fn test_upload_enqueues_verification_and_notification() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract K", b"body").await;
        let v1 = fx.store.latest_version(document.id).unwrap();

        let tasks = fx.drain_tasks();
        assert!(tasks.iter().any(|t| matches!(
            t,
            BackgroundTask::VerifyVersionHash { version_id, .. } if *version_id == v1.id
        )));
        assert!(tasks.iter().any(|t| matches!(
            t,
            BackgroundTask::Notify { recipient, .. } if recipient == "role:CHECKER"
        )));
    }

    #[tokio::test]
    async fn test_reverification_sweep_covers_completed_documents() {
        let fx = EngineFixture::new();

        // One completed, one still pending.
        let done = fx.submit("Done", b"done body").await;
        fx.engine.approve(fx.checker, done.id, None).await.unwrap();
        fx.engine.sign_internal(fx.manager, done.id, None).await.unwrap();
        fx.submit("Pending", b"pending body").await;
        fx.drain_tasks();

        let enqueued = fx.engine.enqueue_reverification_sweep();
        assert_eq!(enqueued, 1);

        let tasks = fx.drain_tasks();
        let approved = fx.store.document(done.id).unwrap().approved_version.unwrap();
        assert!(matches!(
            tasks.as_slice(),
            [BackgroundTask::VerifyVersionHash { version_id, .. }] if *version_id == approved
        ));
    }
}
