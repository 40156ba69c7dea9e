pub(crate) mod post_repository;
pub(crate) mod profile_repository;
pub(crate) mod repositories;

#[cfg(test)]
pub(crate) mod memory;
