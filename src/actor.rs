//! Actor capability contract consumed by the transition engine
//!
//! Role and capability resolution is an external concern. The engine only
//! consumes the boolean answers through this trait and always receives the
//! acting identity as an explicit parameter, never from ambient context.

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Role {
    Bureau,
    Cdo,
    Bidder,
    Superuser,
}

pub trait ActorGateway: Send + Sync {
    /// Whether the actor may administer handshakes at all.
    fn has_bureau_capability(&self, actor: &str, position: &str) -> bool;
    /// Whether the actor's bureau scope covers the position's organization.
    fn has_org_capability(&self, actor: &str, position: &str) -> bool;
    fn has_role(&self, actor: &str, role: Role) -> bool;
}

/// Gateway with a fixed answer for every query. Useful for tests and for
/// callers that resolve permissions before reaching the engine.
pub struct StaticGateway {
    pub bureau: bool,
    pub org: bool,
    pub cdo: bool,
    pub superuser: bool,
}

impl StaticGateway {
    pub fn allow_all() -> Self {
        Self {
            bureau: true,
            org: true,
            cdo: true,
            superuser: false,
        }
    }

    pub fn deny_all() -> Self {
        Self {
            bureau: false,
            org: false,
            cdo: false,
            superuser: false,
        }
    }
}

impl ActorGateway for StaticGateway {
    fn has_bureau_capability(&self, _actor: &str, _position: &str) -> bool {
        self.bureau
    }
    fn has_org_capability(&self, _actor: &str, _position: &str) -> bool {
        self.org
    }
    fn has_role(&self, _actor: &str, role: Role) -> bool {
        match role {
            Role::Cdo => self.cdo,
            Role::Superuser => self.superuser,
            Role::Bureau => self.bureau,
            Role::Bidder => false,
        }
    }
}
