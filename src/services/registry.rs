//! Visitor registry service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{SuspensionReason, VisitorStatus},
        visitor::{NewVisitor, RegisterVisitor, Visitor},
    },
    repository::AccessRepository,
};

#[derive(Clone)]
pub struct VisitorRegistryService {
    repository: Arc<dyn AccessRepository>,
}

impl VisitorRegistryService {
    pub fn new(repository: Arc<dyn AccessRepository>) -> Self {
        Self { repository }
    }

    /// Look up a visitor by (category, phone), creating an active record on
    /// first contact. An existing match is returned unmodified: the request's
    /// name and contact fields never overwrite a known profile.
    pub async fn find_or_create(&self, request: RegisterVisitor) -> AppResult<Visitor> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if let Some(existing) = self
            .repository
            .find_visitor_by_phone(request.category, &request.phone)
            .await?
        {
            return Ok(existing);
        }

        let visitor = self.repository.create_visitor(NewVisitor::from(request)).await?;
        tracing::debug!(
            visitor_id = visitor.id,
            category = %visitor.category,
            "created visitor on first registration"
        );
        Ok(visitor)
    }

    /// Bind an identity document to a visitor, once. Rebinding the same
    /// document is a no-op; a document held by another visitor in the same
    /// category, or a second different document, is a conflict.
    pub async fn bind_identity_document(&self, visitor_id: i64, document: &str) -> AppResult<()> {
        let document = document.trim();
        if document.is_empty() {
            return Err(AppError::Validation(
                "identity document must not be empty".to_string(),
            ));
        }

        let visitor = self.repository.get_visitor(visitor_id).await?;
        if let Some(existing) = &visitor.identity_document {
            if existing == document {
                return Ok(());
            }
            return Err(AppError::Conflict(
                "Visitor already has a different document bound".to_string(),
            ));
        }

        if let Some(holder) = self
            .repository
            .find_visitor_by_document(visitor.category, document)
            .await?
        {
            if holder.id != visitor_id {
                return Err(AppError::Conflict(format!(
                    "Document {} is already bound to another visitor",
                    document
                )));
            }
        }

        self.repository.bind_visitor_document(visitor_id, document).await
    }

    /// Pure status mutation, returning the previous status. No cascade runs
    /// here; callers follow up with a reconciliation pass.
    pub async fn set_status(
        &self,
        visitor_id: i64,
        status: VisitorStatus,
        reason: Option<SuspensionReason>,
    ) -> AppResult<VisitorStatus> {
        let visitor = self.repository.get_visitor(visitor_id).await?;
        self.repository
            .update_visitor_status(visitor_id, status, reason)
            .await?;
        Ok(visitor.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactPrefs, VisitorCategory};
    use crate::repository::MemoryRepository;

    fn service() -> VisitorRegistryService {
        VisitorRegistryService::new(Arc::new(MemoryRepository::new()))
    }

    fn request(phone: &str, name: &str) -> RegisterVisitor {
        RegisterVisitor {
            category: VisitorCategory::DayGuest,
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
            prefs: ContactPrefs::default(),
        }
    }

    #[tokio::test]
    async fn existing_profile_is_not_overwritten() {
        let registry = service();
        let first = registry
            .find_or_create(request("0600000001", "Alex Tran"))
            .await
            .unwrap();
        let second = registry
            .find_or_create(request("0600000001", "Somebody Else"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Alex Tran");
    }

    #[tokio::test]
    async fn same_phone_different_category_is_a_new_visitor() {
        let registry = service();
        let guest = registry
            .find_or_create(request("0600000001", "Alex Tran"))
            .await
            .unwrap();

        let mut supplier_req = request("0600000001", "Alex Tran");
        supplier_req.category = VisitorCategory::Supplier;
        let supplier = registry.find_or_create(supplier_req).await.unwrap();

        assert_ne!(guest.id, supplier.id);
    }

    #[tokio::test]
    async fn rejects_blank_name() {
        let registry = service();
        let err = registry
            .find_or_create(request("0600000001", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn document_binding_is_set_once() {
        let registry = service();
        let visitor = registry
            .find_or_create(request("0600000001", "Alex Tran"))
            .await
            .unwrap();

        registry
            .bind_identity_document(visitor.id, "A123456")
            .await
            .unwrap();
        // Same document again: no-op
        registry
            .bind_identity_document(visitor.id, "A123456")
            .await
            .unwrap();
        let err = registry
            .bind_identity_document(visitor.id, "B999999")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn set_status_returns_previous() {
        let registry = service();
        let visitor = registry
            .find_or_create(request("0600000001", "Alex Tran"))
            .await
            .unwrap();

        let old = registry
            .set_status(visitor.id, VisitorStatus::Suspended, Some(SuspensionReason::Manual))
            .await
            .unwrap();
        assert_eq!(old, VisitorStatus::Active);

        let old = registry
            .set_status(visitor.id, VisitorStatus::Active, None)
            .await
            .unwrap();
        assert_eq!(old, VisitorStatus::Suspended);
    }
}
