pub mod stats;
pub mod ticket;
pub mod user;

pub use self::{
    ticket::Ticket,
    user::{Session, User},
};
