pub mod check;
pub mod client;
pub mod common;
pub mod config;
pub mod pbs;
pub mod search;

#[cfg(test)]
pub(crate) mod tests;

pub type Error = crate::common::error::PbsCheckError;
pub type Result<T> = std::result::Result<T, Error>;

pub const PBSCHECK_VERSION: &str = {
    match option_env!("PBSCHECK_BUILD_VERSION") {
        Some(version) => version,
        None => env!("CARGO_PKG_VERSION"),
    }
};
