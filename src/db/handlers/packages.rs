//! Database repository for packages and variants.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        models::packages::{
            BookingMode, Package, PackageCreateDBRequest, PackageVariant, PackageVariantCreateDBRequest,
        },
    },
    types::{GymId, PackageId, PackageVariantId},
};

pub struct Packages<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Packages<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), err)]
    pub async fn create(&mut self, request: &PackageCreateDBRequest) -> Result<Package> {
        let package = sqlx::query_as::<_, Package>(
            r#"
            INSERT INTO packages (gym_id, name, booking_mode, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, gym_id, name, booking_mode, price, created_at
            "#,
        )
        .bind(request.gym_id)
        .bind(&request.name)
        .bind(request.booking_mode)
        .bind(request.price)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(package)
    }

    #[instrument(skip(self, request), err)]
    pub async fn create_variant(&mut self, request: &PackageVariantCreateDBRequest) -> Result<PackageVariant> {
        let variant = sqlx::query_as::<_, PackageVariant>(
            r#"
            INSERT INTO package_variants (package_id, name, duration_weeks, price, booking_mode)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, package_id, name, duration_weeks, price, booking_mode
            "#,
        )
        .bind(request.package_id)
        .bind(&request.name)
        .bind(request.duration_weeks)
        .bind(request.price)
        .bind(request.booking_mode)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(variant)
    }

    #[instrument(skip(self, id), err)]
    pub async fn get_by_id(&mut self, id: PackageId) -> Result<Option<Package>> {
        let package = sqlx::query_as::<_, Package>(
            "SELECT id, gym_id, name, booking_mode, price, created_at FROM packages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(package)
    }

    #[instrument(skip(self, id), err)]
    pub async fn get_variant(&mut self, id: PackageVariantId) -> Result<Option<PackageVariant>> {
        let variant = sqlx::query_as::<_, PackageVariant>(
            "SELECT id, package_id, name, duration_weeks, price, booking_mode FROM package_variants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(variant)
    }

    /// Resolve the effective booking mode for a booking of `gym_id`.
    ///
    /// Variant override wins, then the package's mode, then the
    /// request-to-book default when no package is referenced. Fails with
    /// NotFound when the package/variant does not exist or belongs to a
    /// different gym.
    #[instrument(skip(self), err)]
    pub async fn resolve_booking_mode(
        &mut self,
        gym_id: GymId,
        package_id: Option<PackageId>,
        variant_id: Option<PackageVariantId>,
    ) -> Result<BookingMode> {
        if let Some(variant_id) = variant_id {
            let row = sqlx::query_as::<_, (Option<BookingMode>, BookingMode)>(
                r#"
                SELECT v.booking_mode, p.booking_mode
                FROM package_variants v
                JOIN packages p ON p.id = v.package_id
                WHERE v.id = $1 AND p.gym_id = $2
                "#,
            )
            .bind(variant_id)
            .bind(gym_id)
            .fetch_optional(&mut *self.db)
            .await?;

            let (variant_mode, package_mode) = row.ok_or(DbError::NotFound)?;
            return Ok(variant_mode.unwrap_or(package_mode));
        }

        if let Some(package_id) = package_id {
            let mode = sqlx::query_as::<_, (BookingMode,)>(
                "SELECT booking_mode FROM packages WHERE id = $1 AND gym_id = $2",
            )
            .bind(package_id)
            .bind(gym_id)
            .fetch_optional(&mut *self.db)
            .await?;

            return mode.map(|(m,)| m).ok_or(DbError::NotFound);
        }

        Ok(BookingMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{Gyms, Repository, Users};
    use crate::db::models::gyms::GymCreateDBRequest;
    use crate::db::models::users::UserCreateDBRequest;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    async fn seed_gym(pool: &PgPool) -> GymId {
        let mut conn = pool.acquire().await.unwrap();
        let owner = Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                email: format!("owner_{}@example.com", uuid::Uuid::new_v4().simple()),
                display_name: None,
                is_admin: false,
            })
            .await
            .unwrap();
        Gyms::new(&mut conn)
            .create(&GymCreateDBRequest {
                owner_id: owner.id,
                name: "Tiger Muay Thai".to_string(),
                city: "Phuket".to_string(),
                country: "TH".to_string(),
                currency: "thb".to_string(),
                is_verified: true,
                is_active: true,
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    async fn test_variant_mode_overrides_package(pool: PgPool) {
        let gym_id = seed_gym(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut packages = Packages::new(&mut conn);

        let package = packages
            .create(&PackageCreateDBRequest {
                gym_id,
                name: "All-inclusive".to_string(),
                booking_mode: BookingMode::RequestToBook,
                price: Decimal::new(50000, 2),
            })
            .await
            .unwrap();
        let variant = packages
            .create_variant(&PackageVariantCreateDBRequest {
                package_id: package.id,
                name: "1 week".to_string(),
                duration_weeks: 1,
                price: Decimal::new(20000, 2),
                booking_mode: Some(BookingMode::Instant),
            })
            .await
            .unwrap();

        let mode = packages
            .resolve_booking_mode(gym_id, Some(package.id), Some(variant.id))
            .await
            .unwrap();
        assert_eq!(mode, BookingMode::Instant);

        // Without the variant, the package's own mode applies
        let mode = packages.resolve_booking_mode(gym_id, Some(package.id), None).await.unwrap();
        assert_eq!(mode, BookingMode::RequestToBook);
    }

    #[sqlx::test]
    async fn test_default_mode_without_package(pool: PgPool) {
        let gym_id = seed_gym(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mode = Packages::new(&mut conn).resolve_booking_mode(gym_id, None, None).await.unwrap();
        assert_eq!(mode, BookingMode::RequestToBook);
    }

    #[sqlx::test]
    async fn test_foreign_gym_package_rejected(pool: PgPool) {
        let gym_a = seed_gym(&pool).await;
        let gym_b = seed_gym(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut packages = Packages::new(&mut conn);

        let package = packages
            .create(&PackageCreateDBRequest {
                gym_id: gym_a,
                name: "Camp pass".to_string(),
                booking_mode: BookingMode::Instant,
                price: Decimal::new(10000, 2),
            })
            .await
            .unwrap();

        let err = packages.resolve_booking_mode(gym_b, Some(package.id), None).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }
}
