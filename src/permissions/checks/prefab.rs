/*!
 * Prefab Checks
 * Checks available in every default registry
 */

use super::registry::CheckFactory;
use super::UserCheck;
use crate::permissions::context::User;

pub mod role {
    use super::*;

    /// Identifier of [`All`]
    pub const ALL: &str = "Prefab.Role.All";
    /// Identifier of [`None`]
    pub const NONE: &str = "Prefab.Role.None";

    /// Every principal passes
    #[derive(Debug, Default, Clone, Copy)]
    pub struct All;

    impl UserCheck for All {
        fn ok(&self, _user: &User) -> bool {
            true
        }
    }

    /// No principal passes
    #[derive(Debug, Default, Clone, Copy)]
    pub struct None;

    impl UserCheck for None {
        fn ok(&self, _user: &User) -> bool {
            false
        }
    }
}

pub(crate) fn factories() -> [CheckFactory; 2] {
    [
        CheckFactory::user(role::ALL, || role::All),
        CheckFactory::user(role::NONE, || role::None),
    ]
}
