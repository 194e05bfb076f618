//! CLI command implementations.
//!
//! - `init`: create the database and seed the state catalog
//! - `add_user`, `set_role`, `users`: manage the identity store
//! - `create`: create a pending reservation
//! - `transition`: approve, reject, cancel, annul or delete a reservation
//! - `show`, `list`, `slots`, `in_range`: query reservations
//! - `sweep`: complete elapsed approved reservations
//! - `validate`: check a configuration file
//! - `completions`: generate shell completion scripts

pub mod add_user;
pub mod completions;
pub mod create;
pub mod in_range;
pub mod init;
pub mod list;
pub mod set_role;
pub mod show;
pub mod slots;
pub mod sweep;
pub mod transition;
pub mod users;
pub mod validate;

pub use add_user::AddUserCommand;
pub use completions::CompletionsCommand;
pub use create::CreateCommand;
pub use in_range::InRangeCommand;
pub use init::InitCommand;
pub use list::ListCommand;
pub use set_role::SetRoleCommand;
pub use show::ShowCommand;
pub use slots::SlotsCommand;
pub use sweep::SweepCommand;
pub use transition::TransitionCommand;
pub use users::UsersCommand;
pub use validate::ValidateCommand;
