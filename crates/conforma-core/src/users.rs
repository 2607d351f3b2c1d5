//! # Users and Authentication
//!
//! Users carry a role and the digest of their API token. There are no
//! passwords: an administrator registers a user and hands over the token
//! printed once at creation (or rotated later by the user).

use crate::access::{CURATORS, require_roles};
use crate::primitives::{EMAIL_LEN, NAME_LEN, check_len};
use crate::storage::{Store, now};
use crate::token::{self, TokenSecret};
use crate::{Actor, ConformaError, Result, Role};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            nome: row.get("nome")?,
            email: row.get("email")?,
            role: row.get("role")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Input for registering a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub nome: String,
    pub email: String,
    pub role: Role,
}

/// A user together with a token that is shown only once.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub usuario: User,
    pub token: String,
}

const USER_COLUMNS: &str = "id, nome, email, role, created_at";

impl Store {
    /// Register a user without an acting principal.
    ///
    /// Used by the CLI to create the first administrator.
    pub fn bootstrap_user(&self, input: &NewUser) -> Result<IssuedToken> {
        let nome = input.nome.trim();
        let email = input.email.trim();
        check_len("nome", nome, NAME_LEN)?;
        check_len("email", email, EMAIL_LEN)?;
        if !email.contains('@') {
            return Err(ConformaError::Validation("Email invalido.".to_string()));
        }
        if self.exists("SELECT 1 FROM usuarios WHERE email = ?1", [email])? {
            return Err(ConformaError::Conflict(
                "Ja existe usuario com este email.".to_string(),
            ));
        }

        let secret = TokenSecret::generate();
        self.conn().execute(
            "INSERT INTO usuarios (nome, email, role, token_digest, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![nome, email, input.role, secret.digest(), now()],
        )?;
        let id = self.last_id();
        tracing::info!(event = "user_registered", user = id, role = input.role.as_str());

        Ok(IssuedToken {
            usuario: self.user(id)?,
            token: secret.token_for(id),
        })
    }

    /// Register a user. ADMIN only.
    pub fn register_user(&self, actor: &Actor, input: &NewUser) -> Result<IssuedToken> {
        require_roles(actor, &[Role::Admin])?;
        self.bootstrap_user(input)
    }

    /// Resolve a bearer token into the acting principal.
    pub fn authenticate(&self, raw_token: &str) -> Result<Actor> {
        let (id, secret) = token::parse(raw_token).ok_or(ConformaError::Unauthorized)?;
        let stored: Option<(String, Role)> = self
            .conn()
            .query_row(
                "SELECT token_digest, role FROM usuarios WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match stored {
            Some((digest, role)) if token::matches(secret, &digest) => Ok(Actor::new(id, role)),
            _ => Err(ConformaError::Unauthorized),
        }
    }

    /// The actor's own user record.
    pub fn current_user(&self, actor: &Actor) -> Result<User> {
        self.user(actor.id)
    }

    /// Replace the actor's token. The previous token stops working.
    pub fn rotate_token(&self, actor: &Actor) -> Result<IssuedToken> {
        let secret = TokenSecret::generate();
        let changed = self.conn().execute(
            "UPDATE usuarios SET token_digest = ?1 WHERE id = ?2",
            params![secret.digest(), actor.id],
        )?;
        if changed == 0 {
            return Err(ConformaError::Unauthorized);
        }
        tracing::info!(event = "token_rotated", user = actor.id);
        Ok(IssuedToken {
            usuario: self.user(actor.id)?,
            token: secret.token_for(actor.id),
        })
    }

    /// Every user ordered by name. ADMIN, GESTOR and AUDITOR only.
    pub fn list_users(&self, actor: &Actor) -> Result<Vec<User>> {
        require_roles(actor, CURATORS)?;
        self.query_list(
            &format!("SELECT {} FROM usuarios ORDER BY nome, id", USER_COLUMNS),
            [],
            User::from_row,
        )
    }

    /// Number of registered users.
    pub fn user_count(&self) -> Result<i64> {
        Ok(self
            .conn()
            .query_row("SELECT COUNT(*) FROM usuarios", [], |row| row.get(0))?)
    }

    /// Fail with `NotFound` unless the user exists.
    pub(crate) fn require_user(&self, id: i64) -> Result<()> {
        if self.exists("SELECT 1 FROM usuarios WHERE id = ?1", [id])? {
            Ok(())
        } else {
            Err(ConformaError::NotFound("Usuario nao encontrado.".to_string()))
        }
    }

    fn user(&self, id: i64) -> Result<User> {
        self.query_one(
            &format!("SELECT {} FROM usuarios WHERE id = ?1", USER_COLUMNS),
            [id],
            User::from_row,
            "Usuario nao encontrado.",
        )
    }
}
