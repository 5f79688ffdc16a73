//! # Tamper Evidence
//!
//! Out-of-band corruption of stored bytes must be caught at every trust
//! boundary - signing, download issuance, capability redemption,
//! signature re-verification, and the background sweep - and must leave
//! a `HASH_VERIFIED_FAIL` record each time.

#[cfg(test)]
mod tests {
    use crate::fixtures::EngineFixture;
    use shared_bus::{EventFilter, EventTopic, WorkflowEvent};
    use shared_types::DocumentStatus;
    use vd_02_audit_trail::{AuditAction, AuditQuery, AuditTrail};
    use vd_03_workflow_engine::{WorkflowApi, WorkflowError};
    use vd_04_download_gate::DownloadError;

    #[tokio::test]
    async fn test_sign_detects_bytes_mutated_after_approval() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract A", b"approved body").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();

        let mut alerts = fx.bus.subscribe(EventFilter::topics(vec![EventTopic::Integrity]));

        // Corrupt the stored bytes between approval and signing.
        fx.blobs
            .corrupt(&fx.latest_storage_ref(document.id), b"swapped body".to_vec());

        let err = fx
            .engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::IntegrityViolation { .. }));
        assert!(!err.is_retryable());

        // Hard stop: no signature, no status change.
        let document = fx.store.document(document.id).unwrap();
        assert_eq!(document.status, DocumentStatus::ApprovedForSigning);
        let approved = document.approved_version.unwrap();
        assert!(fx.store.signatures_of(approved).is_empty());

        // Tamper evidence: audit record and integrity alert.
        let failures = fx
            .trail
            .query(&AuditQuery::for_document(document.id).action(AuditAction::HashVerifiedFail));
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].details.get("stage").map(String::as_str),
            Some("sign_internal")
        );
        assert!(matches!(
            alerts.try_recv().unwrap(),
            Some(WorkflowEvent::IntegrityAlert { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_detects_corruption_after_completion() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract B", b"contract body").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();
        fx.engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap();

        fx.blobs
            .corrupt(&fx.latest_storage_ref(document.id), b"corrupted".to_vec());

        let err = fx
            .engine
            .download_approved(fx.manager, document.id)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::IntegrityViolation { .. }));

        let failures = fx
            .trail
            .query(&AuditQuery::for_document(document.id).action(AuditAction::HashVerifiedFail));
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].details.get("stage").map(String::as_str),
            Some("download_approved")
        );
    }

    #[tokio::test]
    async fn test_redemption_detects_corruption_after_issuance() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract C", b"contract body").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();

        // The capability is issued while the bytes are intact...
        let (token, version) = fx
            .engine
            .download_approved(fx.checker, document.id)
            .await
            .unwrap();

        // ...then storage is corrupted before redemption.
        fx.blobs.corrupt(&version.storage_ref, b"corrupted".to_vec());

        let err = fx.gate.redeem(&token).unwrap_err();
        assert!(matches!(err, DownloadError::IntegrityViolation { .. }));

        let failures = fx
            .trail
            .query(&AuditQuery::for_document(document.id).action(AuditAction::HashVerifiedFail));
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].details.get("stage").map(String::as_str),
            Some("download_redeem")
        );
    }

    #[tokio::test]
    async fn test_signature_verification_fails_on_corrupted_bytes() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract D", b"contract body").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();
        let (_, signature) = fx
            .engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap();

        assert!(fx.engine.verify_signature(signature.id).await.unwrap());

        fx.blobs
            .corrupt(&fx.latest_storage_ref(document.id), b"corrupted".to_vec());

        // Boolean outcome, not an error - with tamper evidence audited.
        assert!(!fx.engine.verify_signature(signature.id).await.unwrap());
        let failures = fx
            .trail
            .query(&AuditQuery::for_document(document.id).action(AuditAction::HashVerifiedFail));
        assert_eq!(failures.len(), 1);
    }

    #[tokio::test]
    async fn test_background_sweep_detects_corruption() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract E", b"contract body").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();
        fx.engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap();
        fx.drain_tasks();

        fx.blobs
            .corrupt(&fx.latest_storage_ref(document.id), b"corrupted".to_vec());

        fx.engine.enqueue_reverification_sweep();
        let worker = fx.worker();
        for task in fx.drain_tasks() {
            worker.handle(task).await;
        }

        let sweeps = fx
            .trail
            .query(&AuditQuery::for_document(document.id).action(AuditAction::BackgroundVerify));
        assert_eq!(sweeps.len(), 1);
        assert_eq!(
            sweeps[0].details.get("outcome").map(String::as_str),
            Some("mismatch")
        );
    }

    #[tokio::test]
    async fn test_lost_bytes_fail_closed() {
        let fx = EngineFixture::new();
        let document = fx.submit("Contract F", b"contract body").await;
        fx.engine.approve(fx.checker, document.id, None).await.unwrap();

        fx.blobs.remove(&fx.latest_storage_ref(document.id));

        // Missing bytes are a fatal storage error, not an integrity
        // mismatch, and not retryable.
        let err = fx
            .engine
            .sign_internal(fx.manager, document.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Storage(_)));
        assert!(!err.is_retryable());
    }
}
