//! Who may address a task to whom. The single source for both the engine
//! and any assignee picker.

use crate::models::Role;

/// Whether a sender with `sender` role may address a task to a user with
/// `target` role. Self-addressed notes are handled by the caller.
pub fn can_address(sender: Role, target: Role) -> bool {
    matches!(
        (sender, target),
        (Role::Sorumlu, Role::Koordinator)
            | (Role::Admin, Role::Sorumlu)
            | (Role::Admin, Role::Koordinator)
    )
}

/// Unit-wide tasks are reserved for roles that oversee units.
pub fn can_address_unit(sender: Role) -> bool {
    matches!(sender, Role::Admin | Role::Sorumlu)
}

pub fn addressable_roles(sender: Role) -> Vec<Role> {
    [Role::Admin, Role::Koordinator, Role::Sorumlu, Role::Izleyici]
        .into_iter()
        .filter(|target| can_address(sender, *target))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addressing_matrix() {
        assert_eq!(addressable_roles(Role::Admin), vec![Role::Koordinator, Role::Sorumlu]);
        assert_eq!(addressable_roles(Role::Sorumlu), vec![Role::Koordinator]);
        assert!(addressable_roles(Role::Koordinator).is_empty());
        assert!(addressable_roles(Role::Izleyici).is_empty());
    }

    #[test]
    fn peers_cannot_address_each_other() {
        for role in [Role::Admin, Role::Koordinator, Role::Sorumlu, Role::Izleyici] {
            assert!(!can_address(role, role), "{role:?} addressed a peer");
        }
    }

    #[test]
    fn unit_addressing_roles() {
        assert!(can_address_unit(Role::Admin));
        assert!(can_address_unit(Role::Sorumlu));
        assert!(!can_address_unit(Role::Koordinator));
        assert!(!can_address_unit(Role::Izleyici));
    }
}
