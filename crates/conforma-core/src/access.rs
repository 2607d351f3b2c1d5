//! # Role-Based Access
//!
//! Role groups used by the repositories and the `require_roles` check.

use crate::{Actor, ConformaError, Result, Role};

/// Administrators and managers.
pub const MANAGERS: &[Role] = &[Role::Admin, Role::Gestor];

/// Managers plus auditors: everyone allowed to curate audit records.
pub const CURATORS: &[Role] = &[Role::Admin, Role::Gestor, Role::Auditor];

/// Every role.
pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::Gestor, Role::Auditor, Role::Responsavel];

/// Fail with `Forbidden` unless the actor holds one of `roles`.
pub fn require_roles(actor: &Actor, roles: &[Role]) -> Result<()> {
    if actor.has_role(roles) {
        return Ok(());
    }
    tracing::debug!(
        event = "access_denied",
        actor = actor.id,
        role = actor.role.as_str(),
        "role not allowed"
    );
    Err(ConformaError::Forbidden(
        "Voce nao possui permissao para esta acao.".to_string(),
    ))
}

/// Fail with `Forbidden` and `message` when `allowed` is false.
pub fn ensure(allowed: bool, message: &str) -> Result<()> {
    if allowed {
        Ok(())
    } else {
        Err(ConformaError::Forbidden(message.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curators_exclude_responsible() {
        let auditor = Actor::new(1, Role::Auditor);
        let responsible = Actor::new(2, Role::Responsavel);
        assert!(require_roles(&auditor, CURATORS).is_ok());
        assert!(matches!(
            require_roles(&responsible, CURATORS),
            Err(ConformaError::Forbidden(_))
        ));
        assert!(require_roles(&responsible, ANY_ROLE).is_ok());
    }

    #[test]
    fn ensure_carries_message() {
        let err = ensure(false, "apenas tarefas atribuidas");
        assert_eq!(
            err,
            Err(ConformaError::Forbidden("apenas tarefas atribuidas".to_string()))
        );
    }
}
