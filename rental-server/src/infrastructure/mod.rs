pub(crate) mod database;
pub(crate) mod jwt;
pub(crate) mod logging;
pub(crate) mod rate_limit;
pub(crate) mod secret;
pub(crate) mod settings;
