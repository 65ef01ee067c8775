use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::{debug, error};
use uuid::Uuid;

use crate::auth::dto::{ProfileForm, SignupForm};
use crate::auth::repo::UserStore;
use crate::auth::repo_types::{NewUser, User};
use crate::error::{AppError, FieldError};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Result of a credential check. `Rejected` is a normal outcome, not an error,
/// and does not say whether the identifier or the password was wrong.
#[derive(Debug)]
pub enum AuthOutcome {
    Authenticated(User),
    Rejected,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Salted Argon2 hash in PHC string form.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            AppError::Internal(anyhow::anyhow!("password hashing failed: {e}"))
        })
}

/// `Ok(false)` on a mismatch. A stored hash that does not parse is an internal error.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is unreadable");
        AppError::Internal(anyhow::anyhow!("unreadable password hash: {e}"))
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, "password verification failed");
            Err(AppError::Internal(anyhow::anyhow!("password verification failed: {e}")))
        }
    }
}

fn validate_identity(username: &str, email: &str, errors: &mut Vec<FieldError>) {
    if username.is_empty() {
        errors.push(FieldError::new("username", "Username is required"));
    }
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Invalid email address"));
    }
}

/// Creates the account. The password is stored only as a salted Argon2 hash.
pub async fn signup(users: &dyn UserStore, form: SignupForm) -> Result<User, AppError> {
    let username = form.username.trim().to_string();
    let email = normalize_email(&form.email);

    let mut errors = Vec::new();
    validate_identity(&username, &email, &mut errors);
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = hash_password(&form.password)?;
    let user = users
        .insert_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;
    debug!(user_id = %user.id, "user row created");
    Ok(user)
}

/// Matches `identifier` as a username first and only falls back to email when
/// no username matches. A username hit with a wrong password is rejected
/// without trying the email branch.
pub async fn authenticate(
    users: &dyn UserStore,
    identifier: &str,
    password: &str,
) -> Result<AuthOutcome, AppError> {
    let identifier = identifier.trim();
    if identifier.is_empty() || password.is_empty() {
        return Ok(AuthOutcome::Rejected);
    }

    let candidate = match users.find_by_username(identifier).await? {
        Some(user) => Some(user),
        None => users.find_by_email(&normalize_email(identifier)).await?,
    };

    let Some(user) = candidate else {
        return Ok(AuthOutcome::Rejected);
    };
    if verify_password(password, &user.password_hash)? {
        Ok(AuthOutcome::Authenticated(user))
    } else {
        Ok(AuthOutcome::Rejected)
    }
}

/// Applies a profile edit after re-checking the current password.
/// Blank fields keep their current value.
pub async fn update_profile(
    users: &dyn UserStore,
    current: &User,
    form: ProfileForm,
) -> Result<AuthOutcome, AppError> {
    if !verify_password(&form.password, &current.password_hash)? {
        return Ok(AuthOutcome::Rejected);
    }

    let username = match form.username.trim() {
        "" => current.username.clone(),
        name => name.to_string(),
    };
    let email = match normalize_email(&form.email) {
        e if e.is_empty() => current.email.clone(),
        e => e,
    };

    let mut errors = Vec::new();
    validate_identity(&username, &email, &mut errors);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let updated = users
        .update_identity(current.id, &username, &email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(AuthOutcome::Authenticated(updated))
}

/// Deletes the account; owned saved searches go with it.
pub async fn delete_account(users: &dyn UserStore, user_id: Uuid) -> Result<(), AppError> {
    if users.delete_user(user_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn form(username: &str, email: &str, password: &str) -> SignupForm {
        SignupForm {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    async fn store_with_alice() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let alice = signup(&store, form("alice", "a@x.com", "secret1"))
            .await
            .expect("signup should succeed");
        (store, alice)
    }

    fn authenticated(outcome: AuthOutcome) -> User {
        match outcome {
            AuthOutcome::Authenticated(user) => user,
            AuthOutcome::Rejected => panic!("expected authenticated outcome"),
        }
    }

    #[test]
    fn hashes_are_salted_and_verifiable() {
        let a = hash_password("secret1").unwrap();
        let b = hash_password("secret1").unwrap();
        assert!(a.starts_with("$argon2"));
        assert_ne!(a, b);
        assert!(verify_password("secret1", &a).unwrap());
        assert!(!verify_password("secret2", &a).unwrap());
    }

    #[test]
    fn unreadable_stored_hash_is_internal_error() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn email_regex() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("not an email"));
    }

    #[tokio::test]
    async fn signup_stores_hash_not_plaintext() {
        let (_, alice) = store_with_alice().await;
        assert_ne!(alice.password_hash, "secret1");
        assert!(verify_password("secret1", &alice.password_hash).unwrap());
    }

    #[tokio::test]
    async fn alice_can_log_in_by_username_or_email() {
        let (store, alice) = store_with_alice().await;

        let by_name = authenticated(authenticate(&store, "alice", "secret1").await.unwrap());
        assert_eq!(by_name.id, alice.id);

        let by_email = authenticated(authenticate(&store, "a@x.com", "secret1").await.unwrap());
        assert_eq!(by_email.id, alice.id);

        let wrong = authenticate(&store, "alice", "wrong").await.unwrap();
        assert!(matches!(wrong, AuthOutcome::Rejected));

        let unknown = authenticate(&store, "nobody", "secret1").await.unwrap();
        assert!(matches!(unknown, AuthOutcome::Rejected));
    }

    #[tokio::test]
    async fn email_branch_is_case_insensitive() {
        let (store, alice) = store_with_alice().await;
        let user = authenticated(authenticate(&store, " A@X.com ", "secret1").await.unwrap());
        assert_eq!(user.id, alice.id);
    }

    #[tokio::test]
    async fn duplicate_signup_fails_and_keeps_existing_record() {
        let (store, alice) = store_with_alice().await;

        let dup_name = signup(&store, form("alice", "new@x.com", "another1")).await;
        assert!(matches!(dup_name, Err(AppError::DuplicateIdentity)));

        let dup_email = signup(&store, form("alice2", "a@x.com", "another1")).await;
        assert!(matches!(dup_email, Err(AppError::DuplicateIdentity)));

        let stored = store.find_user(alice.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, alice.password_hash);
        assert!(store.find_by_email("new@x.com").await.unwrap().is_none());
        assert!(authenticate(&store, "alice", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn signup_validates_fields() {
        let store = MemoryStore::new();
        let err = signup(&store, form(" ", "nope", "123")).await.unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["username", "email", "password"]);
    }

    #[tokio::test]
    async fn username_branch_wins_over_email_branch() {
        let store = MemoryStore::new();
        // bob's username is carol's email
        signup(&store, form("carol@x.com", "bob@x.com", "bobpass1")).await.unwrap();
        let carol = signup(&store, form("carol", "carol@x.com", "carolpass"))
            .await
            .unwrap();

        // carol's password never reaches the email branch
        let outcome = authenticate(&store, "carol@x.com", "carolpass").await.unwrap();
        assert!(matches!(outcome, AuthOutcome::Rejected));

        let by_name = authenticated(authenticate(&store, "carol", "carolpass").await.unwrap());
        assert_eq!(by_name.id, carol.id);
    }

    #[tokio::test]
    async fn profile_update_requires_current_password() {
        let (store, alice) = store_with_alice().await;

        let rejected = update_profile(
            &store,
            &alice,
            ProfileForm {
                username: "alicia".into(),
                email: "".into(),
                password: "wrong".into(),
            },
        )
        .await
        .unwrap();
        assert!(matches!(rejected, AuthOutcome::Rejected));
        assert!(store.find_by_username("alicia").await.unwrap().is_none());

        let updated = authenticated(
            update_profile(
                &store,
                &alice,
                ProfileForm {
                    username: "alicia".into(),
                    email: "".into(),
                    password: "secret1".into(),
                },
            )
            .await
            .unwrap(),
        );
        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.email, "a@x.com");
    }

    #[tokio::test]
    async fn profile_update_rejects_taken_identity() {
        let (store, alice) = store_with_alice().await;
        signup(&store, form("bob", "b@x.com", "bobpass1")).await.unwrap();

        let res = update_profile(
            &store,
            &alice,
            ProfileForm {
                username: "alice".into(),
                email: "b@x.com".into(),
                password: "secret1".into(),
            },
        )
        .await;
        assert!(matches!(res, Err(AppError::DuplicateIdentity)));
        let stored = store.find_user(alice.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "a@x.com");
    }

    #[tokio::test]
    async fn delete_account_removes_user() {
        let (store, alice) = store_with_alice().await;
        delete_account(&store, alice.id).await.unwrap();
        assert!(store.find_user(alice.id).await.unwrap().is_none());
        assert!(matches!(
            delete_account(&store, alice.id).await,
            Err(AppError::NotFound)
        ));
    }
}
