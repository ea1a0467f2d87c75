use sqlx::{postgres::PgRow, query, Row};
use storefront_types::{
    BillingDetails, BillingStore, BillingUpdate, ErrorKind, Failure, Outcome, Username,
};
use tracing::instrument;

use crate::{map_sqlx_error, Operation, PostgresStore};

fn details_from_row(row: &PgRow, operation: Operation) -> Outcome<BillingDetails> {
    let decode = |error: sqlx::Error| map_sqlx_error(error, operation);

    Ok(BillingDetails {
        address: row.try_get("address").map_err(decode)?,
        city: row.try_get("city").map_err(decode)?,
        country: row.try_get("country").map_err(decode)?,
        postal_code: row.try_get("postal_code").map_err(decode)?,
        telephone: row.try_get("telephone").map_err(decode)?,
    })
}

impl BillingStore for PostgresStore {
    async fn billing_details(&self, user: &Username) -> Outcome<BillingDetails> {
        let row = query(
            "SELECT address, city, country, postal_code, telephone
             FROM billing WHERE username = $1",
        )
        .bind(user.as_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::ReadBilling))?
        .ok_or_else(|| {
            Failure::new(
                ErrorKind::NotFound,
                format!("No billing details for user '{user}'."),
            )
            .with_subject(user.to_string())
        })?;
        details_from_row(&row, Operation::ReadBilling)
    }

    #[instrument(name = "postgres.update_billing", skip(self, update))]
    async fn update_billing(
        &self,
        user: &Username,
        update: BillingUpdate,
    ) -> Outcome<BillingDetails> {
        // Trimmed non-blank values only; NULL keeps the stored column.
        let mut patch = BillingDetails::default();
        patch.apply(update);

        let row = query(
            "INSERT INTO billing (username, address, city, country, postal_code, telephone)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (username) DO UPDATE SET
                 address = COALESCE(EXCLUDED.address, billing.address),
                 city = COALESCE(EXCLUDED.city, billing.city),
                 country = COALESCE(EXCLUDED.country, billing.country),
                 postal_code = COALESCE(EXCLUDED.postal_code, billing.postal_code),
                 telephone = COALESCE(EXCLUDED.telephone, billing.telephone)
             RETURNING address, city, country, postal_code, telephone",
        )
        .bind(user.as_ref())
        .bind(patch.address)
        .bind(patch.city)
        .bind(patch.country)
        .bind(patch.postal_code)
        .bind(patch.telephone)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::UpdateBilling))?;
        details_from_row(&row, Operation::UpdateBilling)
    }
}
