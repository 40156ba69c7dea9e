pub(crate) mod admin;
pub(crate) mod cron;
pub(crate) mod posts;
