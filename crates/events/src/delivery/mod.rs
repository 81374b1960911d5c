//! External delivery channels.

pub mod callback;
