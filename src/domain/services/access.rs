use crate::domain::models::membership::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Shipments,
    History,
    Memberships,
    Users,
}

/// The capability matrix: role x resource x action, fixed at compile time.
/// This is the coarse-grained check only — sender/recipient row-level
/// ownership is evaluated by the ledger, not here.
pub fn can(role: Role, action: Action, resource: Resource) -> bool {
    use Action::*;
    use Resource::*;

    match role {
        Role::PlatformAdmin => true,
        Role::TenantOwner => match resource {
            Shipments | Memberships => true,
            History => matches!(action, Create | View),
            Users => matches!(action, View | Update),
        },
        Role::OperatorOrigin | Role::OperatorDestination => match resource {
            Shipments => matches!(action, Create | View | Update),
            History => matches!(action, Create | View),
            Memberships | Users => false,
        },
        Role::Sender | Role::Recipient => match resource {
            Shipments | History => matches!(action, View),
            Memberships | Users => false,
        },
    }
}
