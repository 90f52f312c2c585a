pub mod mode_button;
pub mod mode_poll;
pub mod street_light;
