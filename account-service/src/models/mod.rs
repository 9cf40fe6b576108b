pub mod account;
pub mod parent;

pub use account::{
    AccountRequestStatus, BillingAccess, CreateAccountRequest, RequestState,
    RequestStatusSnapshot, StatusViolation, Tag,
};
pub use parent::{MoveResult, ParentContainer, ParentType, Root};
