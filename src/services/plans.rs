//! Membership plans service

use rust_decimal::Decimal;
use validator::Validate;

use super::{ensure_visible, target_library};
use crate::{
    error::{AppError, AppResult},
    models::{
        plan::{CreatePlan, MembershipPlan, UpdatePlan},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct PlansService {
    repository: Repository,
}

impl PlansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn visible_plan(&self, claims: &UserClaims, id: i32) -> AppResult<MembershipPlan> {
        let plan = self.repository.plans.get_by_id(id).await?;
        ensure_visible(claims, Some(plan.library_id), "Membership plan", id)?;
        Ok(plan)
    }

    pub async fn list(&self, claims: &UserClaims, library_id: Option<i32>) -> AppResult<Vec<MembershipPlan>> {
        self.repository.plans.list(claims.list_scope(library_id)).await
    }

    pub async fn get_by_id(&self, claims: &UserClaims, id: i32) -> AppResult<MembershipPlan> {
        self.visible_plan(claims, id).await
    }

    pub async fn create(&self, claims: &UserClaims, data: CreatePlan) -> AppResult<MembershipPlan> {
        claims.require_staff()?;
        data.validate()?;
        if data.price < Decimal::ZERO {
            return Err(AppError::Validation("Price cannot be negative".to_string()));
        }
        let library_id = target_library(&self.repository, claims, data.library_id).await?;

        let plan = self.repository.plans.create(library_id, &data).await?;
        tracing::info!(plan_id = plan.id, library_id, name = %plan.name, "Membership plan created");
        Ok(plan)
    }

    pub async fn update(&self, claims: &UserClaims, id: i32, data: UpdatePlan) -> AppResult<MembershipPlan> {
        claims.require_staff()?;
        data.validate()?;
        if data.price.map_or(false, |p| p < Decimal::ZERO) {
            return Err(AppError::Validation("Price cannot be negative".to_string()));
        }
        self.visible_plan(claims, id).await?;

        let plan = self.repository.plans.update(id, &data).await?;
        tracing::info!(plan_id = id, "Membership plan updated");
        Ok(plan)
    }

    /// Delete a plan nobody is subscribed to
    pub async fn delete(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        claims.require_staff()?;
        self.visible_plan(claims, id).await?;

        let subscribers = self.repository.users.count_by_plan(id).await?;
        if subscribers > 0 {
            return Err(AppError::Conflict(format!(
                "Membership plan {} has {} subscriber(s); deactivate it instead",
                id, subscribers
            )));
        }

        self.repository.plans.delete(id).await?;
        tracing::info!(plan_id = id, "Membership plan deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{models::enums::Role, repository::MockPorts};

    fn admin(library_id: i32) -> UserClaims {
        UserClaims {
            sub: "admin@example.org".into(),
            user_id: 1,
            role: Role::Admin,
            library_id: Some(library_id),
            exp: Utc::now().timestamp() + 600,
            iat: Utc::now().timestamp(),
        }
    }

    fn plan(id: i32, library_id: i32) -> MembershipPlan {
        MembershipPlan {
            id,
            library_id,
            name: "Basic".into(),
            description: None,
            price: Decimal::new(49900, 2),
            duration_days: 30,
            max_active_bookings: 2,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribed_plan_is_not_deleted() {
        let mut mocks = MockPorts::default();
        mocks.plans.expect_get_by_id().returning(|id| Ok(plan(id, 1)));
        mocks.plans.expect_delete().never();
        mocks.users.expect_count_by_plan().returning(|_| Ok(4));

        let err = PlansService::new(mocks.into()).delete(&admin(1), 9).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn plan_of_other_library_is_not_found() {
        let mut mocks = MockPorts::default();
        mocks.plans.expect_get_by_id().returning(|id| Ok(plan(id, 2)));
        mocks.plans.expect_update().never();

        let err = PlansService::new(mocks.into())
            .update(&admin(1), 9, UpdatePlan::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn member_cannot_create_plans() {
        let member = UserClaims { role: Role::Member, ..admin(1) };
        let request = CreatePlan {
            library_id: None,
            name: "Gold".into(),
            description: None,
            price: Decimal::new(100, 0),
            duration_days: 30,
            max_active_bookings: 3,
        };
        let err = PlansService::new(MockPorts::default().into())
            .create(&member, request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }
}
