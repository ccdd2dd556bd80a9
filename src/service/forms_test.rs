#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::backend::MemoryBackend;
    use crate::rate::Limiter;
    use crate::schema::{JobApplicationForm, NewsletterForm};
    use crate::service::{Forms, ServiceError};

    fn forms(newsletter: u32, jobs: u32) -> (Arc<MemoryBackend>, Forms) {
        let backend = Arc::new(MemoryBackend::new());
        let forms = Forms::new(
            backend.clone(),
            Arc::new(Limiter::new("newsletter", newsletter, Duration::from_secs(600))),
            Arc::new(Limiter::new("job_application", jobs, Duration::from_secs(3600))),
        );
        (backend, forms)
    }

    fn newsletter(email: &str) -> NewsletterForm {
        NewsletterForm {
            email: email.to_string(),
            ..Default::default()
        }
    }

    fn application() -> JobApplicationForm {
        JobApplicationForm {
            name: "Maria".to_string(),
            email: "maria@example.com".to_string(),
            position: "Produção".to_string(),
            message: "Quero muito fazer parte do time do rolê.".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_newsletter_upserts_on_email() {
        let (backend, forms) = forms(10, 10);
        forms
            .subscribe_newsletter("1.1.1.1", newsletter(" Ana@Example.com "))
            .await
            .unwrap();
        forms
            .subscribe_newsletter("1.1.1.1", newsletter("ana@example.com"))
            .await
            .unwrap();

        let rows = backend.rows("newsletter_subscribers");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["email"], "ana@example.com");
    }

    #[tokio::test]
    async fn test_rate_limit_is_per_client_and_checked_first() {
        let (_backend, forms) = forms(2, 10);
        for _ in 0..2 {
            let invalid = forms.subscribe_newsletter("2.2.2.2", newsletter("nope")).await;
            assert!(matches!(invalid, Err(ServiceError::Validation(_))));
        }
        match forms
            .subscribe_newsletter("2.2.2.2", newsletter("ok@example.com"))
            .await
        {
            Err(ServiceError::RateLimited { retry_after }) => {
                assert!(retry_after > Duration::ZERO);
                assert!(retry_after <= Duration::from_secs(600));
            }
            other => panic!("expected rate limit, got {:?}", other),
        }

        forms
            .subscribe_newsletter("3.3.3.3", newsletter("ok@example.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_job_application_returns_id() {
        let (backend, forms) = forms(10, 1);
        let id = forms
            .submit_job_application("4.4.4.4", application())
            .await
            .unwrap();
        assert!(!id.is_empty());
        assert_eq!(backend.rows("job_applications")[0]["id"], id.as_str());

        let limited = forms.submit_job_application("4.4.4.4", application()).await;
        assert!(matches!(limited, Err(ServiceError::RateLimited { .. })));
    }
}
