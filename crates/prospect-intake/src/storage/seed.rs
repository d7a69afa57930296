use chrono::Utc;
use tracing::info;

use crate::auth::{hash_password, AuthError};
use crate::config::SeedAttorney;
use crate::prospects::domain::{Attorney, AttorneyId};
use crate::prospects::repository::AttorneyDirectory;

/// Inserts each seed attorney whose email is not registered yet.
///
/// Safe to run on every start; returns how many attorneys were added.
pub async fn seed_attorneys<D>(directory: &D, seeds: &[SeedAttorney]) -> Result<usize, AuthError>
where
    D: AttorneyDirectory + ?Sized,
{
    let mut inserted = 0;
    for seed in seeds {
        let email = seed.email.trim().to_lowercase();
        if directory.find_by_email(&email).await?.is_some() {
            continue;
        }

        let now = Utc::now();
        let attorney = Attorney {
            id: AttorneyId::new(),
            name: seed.name.trim().to_string(),
            email,
            password_hash: hash_password(&seed.password).await?,
            created_at: now,
            updated_at: now,
        };
        if directory.insert_if_absent(attorney).await? {
            info!(email = %seed.email, "seeded attorney");
            inserted += 1;
        }
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;

    #[tokio::test]
    async fn seeding_twice_adds_each_attorney_once() {
        let store = SqliteStore::in_memory().await.expect("memory database");
        store.migrate().await.expect("schema applies");
        let seeds = vec![SeedAttorney {
            name: "Alex Morgan".to_string(),
            email: "Hello@Example.com".to_string(),
            password: "pw1".to_string(),
        }];

        assert_eq!(seed_attorneys(&store, &seeds).await.expect("seed"), 1);
        assert_eq!(seed_attorneys(&store, &seeds).await.expect("reseed"), 0);

        let attorneys = store.all().await.expect("all");
        assert_eq!(attorneys.len(), 1);
        assert_eq!(attorneys[0].email, "hello@example.com");
        assert!(bcrypt::verify("pw1", &attorneys[0].password_hash).expect("verify"));
    }
}
