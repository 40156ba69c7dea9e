pub(crate) mod access_service;
pub(crate) mod admin_service;
pub(crate) mod expiry_service;
pub(crate) mod lifecycle;
pub(crate) mod listing_service;
