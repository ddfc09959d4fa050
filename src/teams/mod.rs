//! Teams, memberships, invitations and the single-active-team invariant.
//!
//! Layout mirrors the data model: [`types`] holds the entities,
//! [`repository`] the persistence seams, and the service structs compose
//! them into the atomic operations the application calls.

pub mod access;
pub mod add_member;
pub mod invitations;
pub mod lifecycle;
pub mod membership;
pub mod repository;
pub mod roles;
pub mod types;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use access::{AccessResolver, TokenScope};
pub use add_member::{DirectMemberAdder, MemberAdder};
pub use invitations::{IdentityResolution, InvitationService, InviteInput};
pub use lifecycle::TeamLifecycle;
pub use membership::MembershipService;
pub use repository::{
    CreateInvitation, CreateMembership, CreateTeam, TeamInvitationRepository,
    TeamMembershipRepository, TeamRepository, TransactionManager,
};
pub use roles::{RoleDefinition, RoleRegistry, TeamRole};
pub use types::{Team, TeamInvitation, TeamMembership};
