pub mod ip;
pub mod poll;
pub mod requests;
pub mod respond;
pub mod responses;
pub mod sessions;
pub mod stream;
