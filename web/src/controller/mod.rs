pub(crate) mod auth_controller;
pub(crate) mod calendar_controller;
pub(crate) mod health_check_controller;
pub(crate) mod notetaker_controller;
pub(crate) mod recording_controller;
pub(crate) mod webhook_controller;
