/// Organization (cooperative) model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255),
///     document VARCHAR(64) NOT NULL,
///     address_street VARCHAR(255),
///     address_number VARCHAR(32),
///     address_neighborhood VARCHAR(255),
///     address_city VARCHAR(255),
///     address_zipcode VARCHAR(32),
///     manager_id UUID REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```
///
/// `document` and `email` are unique among live rows
/// (`organizations_document_active_key`, `organizations_email_active_key`).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserProfile;

const ORGANIZATION_COLUMNS: &str = "id, name, email, document, address_street, address_number, \
     address_neighborhood, address_city, address_zipcode, manager_id, created_at, updated_at, deleted_at";

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,

    /// Registration document (CNPJ or equivalent)
    pub document: String,

    pub address_street: Option<String>,
    pub address_number: Option<String>,
    pub address_neighborhood: Option<String>,
    pub address_city: Option<String>,
    pub address_zipcode: Option<String>,
    pub manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Organization {
    /// Whether `user_id` manages this organization
    pub fn is_managed_by(&self, user_id: Uuid) -> bool {
        self.manager_id == Some(user_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateOrganization {
    pub name: String,
    pub email: Option<String>,
    pub document: String,
    pub address_street: Option<String>,
    pub address_number: Option<String>,
    pub address_neighborhood: Option<String>,
    pub address_city: Option<String>,
    pub address_zipcode: Option<String>,
    pub manager_id: Option<Uuid>,
}

/// Partial update; nullable columns are cleared with `Some(None)`
#[derive(Debug, Clone, Default)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub document: Option<String>,
    pub address_street: Option<Option<String>>,
    pub address_number: Option<Option<String>>,
    pub address_neighborhood: Option<Option<String>>,
    pub address_city: Option<Option<String>>,
    pub address_zipcode: Option<Option<String>>,
    pub manager_id: Option<Option<Uuid>>,
}

impl UpdateOrganization {
    pub fn apply(self, organization: &mut Organization) {
        if let Some(name) = self.name {
            organization.name = name;
        }
        if let Some(email) = self.email {
            organization.email = email;
        }
        if let Some(document) = self.document {
            organization.document = document;
        }
        if let Some(street) = self.address_street {
            organization.address_street = street;
        }
        if let Some(number) = self.address_number {
            organization.address_number = number;
        }
        if let Some(neighborhood) = self.address_neighborhood {
            organization.address_neighborhood = neighborhood;
        }
        if let Some(city) = self.address_city {
            organization.address_city = city;
        }
        if let Some(zipcode) = self.address_zipcode {
            organization.address_zipcode = zipcode;
        }
        if let Some(manager_id) = self.manager_id {
            organization.manager_id = manager_id;
        }
        organization.updated_at = Utc::now();
    }
}

/// Organization as returned by the API, with the manager embedded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationView {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub document: String,
    pub address_street: Option<String>,
    pub address_number: Option<String>,
    pub address_neighborhood: Option<String>,
    pub address_city: Option<String>,
    pub address_zipcode: Option<String>,
    pub manager: Option<UserProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrganizationView {
    pub fn new(organization: Organization, manager: Option<UserProfile>) -> Self {
        Self {
            id: organization.id,
            name: organization.name,
            email: organization.email,
            document: organization.document,
            address_street: organization.address_street,
            address_number: organization.address_number,
            address_neighborhood: organization.address_neighborhood,
            address_city: organization.address_city,
            address_zipcode: organization.address_zipcode,
            manager,
            created_at: organization.created_at,
            updated_at: organization.updated_at,
        }
    }
}

impl Organization {
    pub async fn create(pool: &PgPool, data: CreateOrganization) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO organizations (name, email, document, address_street, address_number, \
             address_neighborhood, address_city, address_zipcode, manager_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {ORGANIZATION_COLUMNS}"
        );

        sqlx::query_as::<_, Organization>(&query)
            .bind(data.name)
            .bind(data.email)
            .bind(data.document)
            .bind(data.address_street)
            .bind(data.address_number)
            .bind(data.address_neighborhood)
            .bind(data.address_city)
            .bind(data.address_zipcode)
            .bind(data.manager_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1 AND deleted_at IS NULL"
        );

        sqlx::query_as::<_, Organization>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_document(
        pool: &PgPool,
        document: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE document = $1 AND deleted_at IS NULL"
        );

        sqlx::query_as::<_, Organization>(&query)
            .bind(document)
            .fetch_optional(pool)
            .await
    }

    /// Lists live organizations, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE deleted_at IS NULL \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );

        sqlx::query_as::<_, Organization>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateOrganization,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE organizations SET updated_at = NOW()");
        let mut bind_count = 1;

        let columns = [
            ("name", data.name.is_some()),
            ("email", data.email.is_some()),
            ("document", data.document.is_some()),
            ("address_street", data.address_street.is_some()),
            ("address_number", data.address_number.is_some()),
            ("address_neighborhood", data.address_neighborhood.is_some()),
            ("address_city", data.address_city.is_some()),
            ("address_zipcode", data.address_zipcode.is_some()),
            ("manager_id", data.manager_id.is_some()),
        ];

        for (column, present) in columns {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {} = ${}", column, bind_count));
            }
        }

        query.push_str(&format!(
            " WHERE id = $1 AND deleted_at IS NULL RETURNING {ORGANIZATION_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Organization>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(document) = data.document {
            q = q.bind(document);
        }
        if let Some(street) = data.address_street {
            q = q.bind(street);
        }
        if let Some(number) = data.address_number {
            q = q.bind(number);
        }
        if let Some(neighborhood) = data.address_neighborhood {
            q = q.bind(neighborhood);
        }
        if let Some(city) = data.address_city {
            q = q.bind(city);
        }
        if let Some(zipcode) = data.address_zipcode {
            q = q.bind(zipcode);
        }
        if let Some(manager_id) = data.manager_id {
            q = q.bind(manager_id);
        }

        q.fetch_optional(pool).await
    }

    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE organizations SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
